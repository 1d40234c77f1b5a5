//! ledger.rs
//!
//! Леджер доступности: авторитетные счетчики `(сеанс, категория) ->
//! {всего, выкуплено}`. Единственное место в системе, где требуется
//! взаимное исключение: check-and-decrement под мьютексом строки, чтобы
//! конкурентные резервы одной пары никогда не продали больше, чем есть.
//!
//! Гранулярность блокировки — строка, не весь леджер: резервы на разные
//! пары друг с другом не конкурируют. Сама карта строк стоит за RwLock
//! и пишется только при установке новой строки из конфигурации каталога.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BookingError, Result};
use crate::models::SlotSeatAvailability;

/// Подтверждение удержанных мест. Выдается `try_reserve`, гасится
/// `release`. Погашение идемпотентно по id токена.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationToken {
    id: Uuid,
    slot_id: i64,
    seat_type_id: i64,
    quantity: u32,
}

impl ReservationToken {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn slot_id(&self) -> i64 {
        self.slot_id
    }

    pub fn seat_type_id(&self) -> i64 {
        self.seat_type_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

struct LedgerEntry {
    total_seats: u32,
    booked_seats: u32,
    // id живых токенов; наличие id = его места еще удержаны
    active_tokens: HashSet<Uuid>,
}

type LedgerKey = (i64, i64);

#[derive(Default)]
pub struct AvailabilityLedger {
    entries: RwLock<HashMap<LedgerKey, Arc<Mutex<LedgerEntry>>>>,
}

impl AvailabilityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Устанавливает строку вместимости из конфигурации каталога.
    /// Первая запись выигрывает: вместимость неизменна, как только по
    /// сеансу пошли брони.
    pub fn configure(&self, slot_id: i64, seat_type_id: i64, total_seats: u32) {
        let mut entries = self.entries.write();
        entries
            .entry((slot_id, seat_type_id))
            .or_insert_with(|| {
                tracing::debug!(slot_id, seat_type_id, total_seats, "ledger row installed");
                Arc::new(Mutex::new(LedgerEntry {
                    total_seats,
                    booked_seats: 0,
                    active_tokens: HashSet::new(),
                }))
            });
    }

    pub fn is_configured(&self, slot_id: i64, seat_type_id: i64) -> bool {
        self.entries.read().contains_key(&(slot_id, seat_type_id))
    }

    /// `total - booked` для пары. `NotFound`, если строка не настроена —
    /// это не то же самое, что ноль свободных мест.
    pub fn get_remaining(&self, slot_id: i64, seat_type_id: i64) -> Result<u32> {
        let entry = self.entry(slot_id, seat_type_id)?;
        let entry = entry.lock();
        Ok(entry.total_seats - entry.booked_seats)
    }

    /// Атомарный check-and-decrement. Либо удерживает ровно `quantity`
    /// мест и возвращает токен, либо не меняет ничего.
    pub fn try_reserve(
        &self,
        slot_id: i64,
        seat_type_id: i64,
        quantity: u32,
    ) -> Result<ReservationToken> {
        if quantity == 0 {
            return Err(BookingError::invalid("quantity must be greater than zero"));
        }
        let entry = self.entry(slot_id, seat_type_id)?;
        let mut entry = entry.lock();

        let remaining = entry.total_seats - entry.booked_seats;
        if remaining < quantity {
            return Err(BookingError::InsufficientCapacity {
                requested: quantity,
                remaining,
            });
        }

        entry.booked_seats += quantity;
        let token = ReservationToken {
            id: Uuid::new_v4(),
            slot_id,
            seat_type_id,
            quantity,
        };
        entry.active_tokens.insert(token.id);
        Ok(token)
    }

    /// Возвращает удержанные токеном места. Повторный вызов с тем же
    /// токеном — no-op, чтобы компенсации и ретраи были безопасны.
    pub fn release(&self, token: &ReservationToken) {
        let Ok(entry) = self.entry(token.slot_id, token.seat_type_id) else {
            return;
        };
        let mut entry = entry.lock();
        if entry.active_tokens.remove(&token.id) {
            entry.booked_seats -= token.quantity;
            tracing::debug!(
                slot_id = token.slot_id,
                seat_type_id = token.seat_type_id,
                quantity = token.quantity,
                "reservation released"
            );
        }
    }

    /// Срез строк леджера по сеансу, отсортирован по id категории. Все
    /// замки строк сеанса берутся одновременно, поэтому внутри одной
    /// выдачи не видно частичных обновлений.
    pub fn list_availability(&self, slot_id: i64) -> Vec<SlotSeatAvailability> {
        let entries = self.entries.read();
        let mut slot_entries: Vec<(i64, &Arc<Mutex<LedgerEntry>>)> = entries
            .iter()
            .filter(|((slot, _), _)| *slot == slot_id)
            .map(|((_, seat_type), entry)| (*seat_type, entry))
            .collect();
        slot_entries.sort_by_key(|(seat_type, _)| *seat_type);

        // Единственный путь, берущий несколько замков строк; порядок по
        // ключу фиксирован, дедлок невозможен.
        let guards: Vec<(i64, parking_lot::MutexGuard<'_, LedgerEntry>)> = slot_entries
            .into_iter()
            .map(|(seat_type, entry)| (seat_type, entry.lock()))
            .collect();

        guards
            .iter()
            .map(|(seat_type, entry)| SlotSeatAvailability {
                slot_id,
                seat_type_id: *seat_type,
                total_seats: entry.total_seats,
                booked_seats: entry.booked_seats,
            })
            .collect()
    }

    fn entry(&self, slot_id: i64, seat_type_id: i64) -> Result<Arc<Mutex<LedgerEntry>>> {
        self.entries
            .read()
            .get(&(slot_id, seat_type_id))
            .cloned()
            .ok_or_else(|| {
                BookingError::not_found(
                    "availability row",
                    format!("slot {} / seat type {}", slot_id, seat_type_id),
                )
            })
    }
}
