//! booking.rs
//!
//! Сервисный слой бронирования.
//!
//! Ключевые компоненты:
//! 1.  **BookingEngine**: оркестратор одной попытки брони по конвейеру
//!     Requested -> Validated -> CapacityHeld -> Priced -> Issued. Любой
//!     сбой после успешного резерва обязан вернуть места компенсирующим
//!     `release` — клиент всегда видит терминальное согласованное
//!     состояние, без утечки вместимости.
//! 2.  **BookingStore**: записи о бронях, которыми владеет движок.
//!     Единственная мутация — атомарный переход Active -> Cancelled;
//!     отмененные записи остаются для аудита.
//! 3.  **Запросы витрины**: остатки по сеансу (в порядке расположения
//!     категорий), сеансы с живыми местами, история броней пользователя.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::catalog::CatalogStore;
use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::ledger::{AvailabilityLedger, ReservationToken};
use crate::models::{Booking, BookingStatus, OpenSlot, SeatAvailability};
use crate::pricing;
use crate::ticket::TicketIssuer;

/// Запрос на бронь: количество мест категории на сеанс.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookSeatsRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
    pub slot_id: i64,
    pub seat_type_id: i64,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

struct StoredBooking {
    booking: Booking,
    token: ReservationToken,
}

/// Хранилище броней в памяти. Владеет записями; наружу отдает копии.
#[derive(Default)]
pub struct BookingStore {
    inner: Mutex<HashMap<Uuid, StoredBooking>>,
}

impl BookingStore {
    fn insert(&self, booking: Booking, token: ReservationToken) -> Result<()> {
        self.inner
            .lock()
            .insert(booking.id, StoredBooking { booking, token });
        Ok(())
    }

    fn get(&self, booking_id: Uuid) -> Option<Booking> {
        self.inner
            .lock()
            .get(&booking_id)
            .map(|stored| stored.booking.clone())
    }

    /// Атомарный переход Active -> Cancelled. Возвращает токен брони,
    /// чтобы вызывающий вернул места в леджер.
    fn cancel(&self, booking_id: Uuid) -> Result<ReservationToken> {
        let mut inner = self.inner.lock();
        let stored = inner
            .get_mut(&booking_id)
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;
        if stored.booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }
        stored.booking.status = BookingStatus::Cancelled;
        Ok(stored.token.clone())
    }

    fn list_for_user(&self, user_id: i64) -> Vec<Booking> {
        let inner = self.inner.lock();
        let mut bookings: Vec<Booking> = inner
            .values()
            .filter(|stored| stored.booking.user_id == user_id)
            .map(|stored| stored.booking.clone())
            .collect();
        // новые сверху, как в выдаче списка броней
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        bookings
    }
}

pub struct BookingEngine {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<AvailabilityLedger>,
    bookings: BookingStore,
    issuer: TicketIssuer,
    config: BookingConfig,
}

impl BookingEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: BookingConfig) -> Self {
        let issuer = TicketIssuer::new(config.ticket_prefix.clone());
        Self {
            catalog,
            ledger: Arc::new(AvailabilityLedger::new()),
            bookings: BookingStore::default(),
            issuer,
            config,
        }
    }

    pub fn ledger(&self) -> &AvailabilityLedger {
        &self.ledger
    }

    /// Бронирует `quantity` мест категории на сеанс. Проверки идут до
    /// какого-либо касания леджера; исчерпание вместимости — `SoldOut`.
    pub async fn book_seats(&self, req: BookSeatsRequest) -> Result<Booking> {
        req.validate()
            .map_err(|e| BookingError::invalid(e.to_string()))?;
        if req.quantity > self.config.max_seats_per_booking {
            return Err(BookingError::invalid(format!(
                "quantity {} exceeds the per-booking limit of {}",
                req.quantity, self.config.max_seats_per_booking
            )));
        }

        let slot = match self.catalog.get_slot(req.slot_id).await {
            Ok(slot) => slot,
            Err(BookingError::NotFound { .. }) => {
                return Err(BookingError::invalid(format!(
                    "slot {} does not exist",
                    req.slot_id
                )))
            }
            Err(e) => return Err(e),
        };
        if !slot.watchable {
            return Err(BookingError::invalid(format!(
                "slot {} is not watchable",
                slot.id
            )));
        }

        let seat_type = match self.catalog.get_seat_type(req.seat_type_id).await {
            Ok(seat_type) => seat_type,
            Err(BookingError::NotFound { .. }) => {
                return Err(BookingError::invalid(format!(
                    "seat type {} does not exist",
                    req.seat_type_id
                )))
            }
            Err(e) => return Err(e),
        };

        match self.ensure_configured(req.slot_id, req.seat_type_id).await {
            Ok(()) => {}
            Err(BookingError::NotFound { .. }) => {
                return Err(BookingError::invalid(format!(
                    "seat type {} is not offered for slot {}",
                    req.seat_type_id, req.slot_id
                )))
            }
            Err(e) => return Err(e),
        }

        let token = match self
            .ledger
            .try_reserve(req.slot_id, req.seat_type_id, req.quantity)
        {
            Ok(token) => token,
            Err(BookingError::InsufficientCapacity {
                requested,
                remaining,
            }) => {
                warn!(
                    slot_id = req.slot_id,
                    seat_type_id = req.seat_type_id,
                    requested,
                    remaining,
                    "booking rejected: sold out"
                );
                return Err(BookingError::SoldOut {
                    requested,
                    remaining,
                });
            }
            Err(e) => return Err(e),
        };

        // Места удержаны: любой сбой дальше обязан вернуть их в леджер.
        let total_price =
            match pricing::compute_price(slot.base_price, seat_type.premium_percentage, req.quantity)
            {
                Ok(total) => total,
                Err(e) => {
                    self.ledger.release(&token);
                    return Err(e);
                }
            };

        let booking = Booking {
            id: Uuid::new_v4(),
            slot_id: req.slot_id,
            seat_type_id: req.seat_type_id,
            user_id: req.user_id,
            quantity: req.quantity,
            ticket_number: self.issuer.issue(slot.id),
            total_price,
            status: BookingStatus::Active,
            created_at: Utc::now(),
        };

        if let Err(e) = self.bookings.insert(booking.clone(), token.clone()) {
            self.ledger.release(&token);
            return Err(e);
        }

        info!(
            booking_id = %booking.id,
            ticket = %booking.ticket_number,
            slot_id = booking.slot_id,
            seat_type_id = booking.seat_type_id,
            quantity = booking.quantity,
            total_price = booking.total_price,
            "booking issued"
        );
        Ok(booking)
    }

    /// Отмена брони: помечает запись отмененной и возвращает места.
    /// Повторная отмена — `AlreadyCancelled`: для пользователя отмена не
    /// должна выглядеть успешной дважды, в отличие от идемпотентного
    /// `release` внутри леджера.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> Result<()> {
        let token = self.bookings.cancel(booking_id)?;
        self.ledger.release(&token);
        info!(booking_id = %booking_id, "booking cancelled");
        Ok(())
    }

    /// Остаток мест пары (сеанс, категория). `NotFound`, если вместимость
    /// не сконфигурирована ни явно, ни шаблоном зала.
    pub async fn get_remaining(&self, slot_id: i64, seat_type_id: i64) -> Result<u32> {
        self.ensure_configured(slot_id, seat_type_id).await?;
        self.ledger.get_remaining(slot_id, seat_type_id)
    }

    /// Остатки по всем категориям сеанса, в порядке расположения в зале.
    pub async fn list_availability(&self, slot_id: i64) -> Result<Vec<SeatAvailability>> {
        // сеанс должен существовать, иначе NotFound
        let _ = self.catalog.get_slot(slot_id).await?;

        for (seat_type_id, total_seats) in self.catalog.list_slot_seat_configs(slot_id).await? {
            self.ledger.configure(slot_id, seat_type_id, total_seats);
        }

        let mut availability = Vec::new();
        for row in self.ledger.list_availability(slot_id) {
            let seat_type = self.catalog.get_seat_type(row.seat_type_id).await?;
            availability.push(SeatAvailability {
                seat_type_id: row.seat_type_id,
                seat_type_name: seat_type.name,
                location: seat_type.location,
                remaining: row.remaining(),
            });
        }
        availability.sort_by_key(|a| (a.location, a.seat_type_id));
        Ok(availability)
    }

    /// Витрина "что еще можно посмотреть": сеансы с хотя бы одним
    /// свободным местом, в порядке начала.
    pub async fn list_open_slots(&self) -> Result<Vec<OpenSlot>> {
        let mut open = Vec::new();
        for slot in self.catalog.list_slots().await? {
            if !slot.watchable {
                continue;
            }
            let remaining: u32 = self
                .list_availability(slot.id)
                .await?
                .iter()
                .map(|a| a.remaining)
                .sum();
            if remaining > 0 {
                open.push(OpenSlot { slot, remaining });
            }
        }
        Ok(open)
    }

    pub fn get_booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.bookings.get(booking_id)
    }

    /// История броней пользователя, новые сверху.
    pub fn bookings_for_user(&self, user_id: i64) -> Vec<Booking> {
        self.bookings.list_for_user(user_id)
    }

    // Лениво устанавливает строку леджера из конфигурации каталога.
    // Первая установка выигрывает, конфиг вместимости неизменен после
    // начала продаж.
    async fn ensure_configured(&self, slot_id: i64, seat_type_id: i64) -> Result<()> {
        if self.ledger.is_configured(slot_id, seat_type_id) {
            return Ok(());
        }
        let total_seats = self
            .catalog
            .get_slot_seat_config(slot_id, seat_type_id)
            .await?;
        self.ledger.configure(slot_id, seat_type_id, total_seats);
        Ok(())
    }
}
