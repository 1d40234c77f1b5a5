use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Cancelled,
}

/// Неизменяемая запись о бронировании. Создаётся только движком после
/// успешного резерва; единственная допустимая мутация — переход
/// Active -> Cancelled. Цена фиксируется в момент создания и не зависит
/// от последующих изменений прайса сеанса.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: i64,
    pub seat_type_id: i64,
    pub user_id: i64,
    pub quantity: u32,
    pub ticket_number: String,
    /// Total price in minor currency units, frozen at booking time.
    pub total_price: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}
