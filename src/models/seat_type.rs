use serde::{Deserialize, Serialize};

/// Категория мест (Regular, VIP, Couple...). Бронируется количеством,
/// а не конкретными креслами.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatType {
    pub id: i64,
    pub name: String,
    /// Наценка к базовой цене сеанса, в процентах (50.0 = +50%).
    pub premium_percentage: f64,
    /// Display rank only (front of the hall first). Not ownership-relevant.
    pub location: u32,
}
