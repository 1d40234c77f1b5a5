//! catalog.rs
//!
//! Интерфейс к каталогу кинотеатра (фильмы, сеансы, категории мест,
//! конфигурация вместимости). Для движка каталог — внешний коллаборатор
//! и read-only: движок его только читает, владеет им объемлющий сервис.
//!
//! `InMemoryCatalog` — реализация для тестов и разработки; её сеттеры —
//! это "владельческая" сторона, которой у настоящего каталога здесь нет.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{BookingError, Result};
use crate::models::{MovieSlot, SeatType};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_slot(&self, slot_id: i64) -> Result<MovieSlot>;

    async fn get_seat_type(&self, seat_type_id: i64) -> Result<SeatType>;

    /// Настроенная вместимость пары (сеанс, категория). `NotFound`, если
    /// категория на сеансе не продается.
    async fn get_slot_seat_config(&self, slot_id: i64, seat_type_id: i64) -> Result<u32>;

    /// Все категории, продающиеся на сеансе: `(seat_type_id, total_seats)`.
    async fn list_slot_seat_configs(&self, slot_id: i64) -> Result<Vec<(i64, u32)>>;

    async fn list_slots(&self) -> Result<Vec<MovieSlot>>;
}

/// Каталог в памяти. Явная строка (сеанс, категория) перекрывает шаблон
/// зала; шаблон избавляет владельца от настройки рассадки под каждый
/// сеанс отдельно.
#[derive(Default)]
pub struct InMemoryCatalog {
    slots: RwLock<HashMap<i64, MovieSlot>>,
    seat_types: RwLock<HashMap<i64, SeatType>>,
    slot_configs: RwLock<HashMap<(i64, i64), u32>>,
    // showroom_id -> (seat_type_id -> total_seats)
    showroom_defaults: RwLock<HashMap<i64, HashMap<i64, u32>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_slot(&self, slot: MovieSlot) {
        self.slots.write().insert(slot.id, slot);
    }

    pub fn insert_seat_type(&self, seat_type: SeatType) {
        self.seat_types.write().insert(seat_type.id, seat_type);
    }

    /// Явная вместимость категории на конкретном сеансе.
    pub fn set_slot_capacity(&self, slot_id: i64, seat_type_id: i64, total_seats: u32) {
        self.slot_configs
            .write()
            .insert((slot_id, seat_type_id), total_seats);
    }

    /// Шаблон рассадки зала: применяется к сеансам зала без явных строк.
    pub fn set_showroom_default(&self, showroom_id: i64, seat_type_id: i64, total_seats: u32) {
        self.showroom_defaults
            .write()
            .entry(showroom_id)
            .or_default()
            .insert(seat_type_id, total_seats);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_slot(&self, slot_id: i64) -> Result<MovieSlot> {
        self.slots
            .read()
            .get(&slot_id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("slot", slot_id))
    }

    async fn get_seat_type(&self, seat_type_id: i64) -> Result<SeatType> {
        self.seat_types
            .read()
            .get(&seat_type_id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("seat type", seat_type_id))
    }

    async fn get_slot_seat_config(&self, slot_id: i64, seat_type_id: i64) -> Result<u32> {
        if let Some(total) = self.slot_configs.read().get(&(slot_id, seat_type_id)) {
            return Ok(*total);
        }
        // fallback на шаблон зала
        let slot = self.get_slot(slot_id).await?;
        self.showroom_defaults
            .read()
            .get(&slot.showroom_id)
            .and_then(|defaults| defaults.get(&seat_type_id))
            .copied()
            .ok_or_else(|| {
                BookingError::not_found(
                    "seat capacity config",
                    format!("slot {} / seat type {}", slot_id, seat_type_id),
                )
            })
    }

    async fn list_slot_seat_configs(&self, slot_id: i64) -> Result<Vec<(i64, u32)>> {
        let slot = self.get_slot(slot_id).await?;

        let mut merged: HashMap<i64, u32> = self
            .showroom_defaults
            .read()
            .get(&slot.showroom_id)
            .cloned()
            .unwrap_or_default();
        for ((slot, seat_type), total) in self.slot_configs.read().iter() {
            if *slot == slot_id {
                merged.insert(*seat_type, *total);
            }
        }

        let mut configs: Vec<(i64, u32)> = merged.into_iter().collect();
        configs.sort_by_key(|(seat_type, _)| *seat_type);
        Ok(configs)
    }

    async fn list_slots(&self) -> Result<Vec<MovieSlot>> {
        let mut slots: Vec<MovieSlot> = self.slots.read().values().cloned().collect();
        slots.sort_by_key(|slot| (slot.starts_at, slot.id));
        Ok(slots)
    }
}
