use serde::{Deserialize, Serialize};

use super::slot::MovieSlot;

/// Строка леджера: сколько мест категории настроено и выкуплено на сеанс.
/// Инвариант всей системы: `0 <= booked_seats <= total_seats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSeatAvailability {
    pub slot_id: i64,
    pub seat_type_id: i64,
    pub total_seats: u32,
    pub booked_seats: u32,
}

impl SlotSeatAvailability {
    pub fn remaining(&self) -> u32 {
        self.total_seats - self.booked_seats
    }
}

/// Одна позиция в выдаче "какие места ещё свободны" для сеанса.
/// Отсортировано по `location` категории — порядок витрины.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub seat_type_id: i64,
    pub seat_type_name: String,
    pub location: u32,
    pub remaining: u32,
}

/// Сеанс, на который ещё можно купить хотя бы одно место.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlot {
    pub slot: MovieSlot,
    /// Total remaining seats across every category of the slot.
    pub remaining: u32,
}
