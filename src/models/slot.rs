use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Сеанс: фильм в конкретном зале в конкретное время.
///
/// `watchable` is the movie-level flag flattened into the slot view the
/// catalog hands us; a slot for a pulled movie is not bookable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSlot {
    pub id: i64,
    pub movie_id: i64,
    pub showroom_id: i64,
    /// Base price in minor currency units (cents).
    pub base_price: i64,
    pub starts_at: DateTime<Utc>,
    pub watchable: bool,
}
