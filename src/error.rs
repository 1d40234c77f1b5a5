use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, BookingError>;

/// Ошибки движка бронирования. Все публичные операции возвращают
/// `Result<T, BookingError>`; ничего не глотается молча.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ledger-level rejection: the check-and-decrement found fewer seats
    /// than requested. No side effect has occurred.
    #[error("insufficient capacity: requested {requested}, remaining {remaining}")]
    InsufficientCapacity { requested: u32, remaining: u32 },

    /// Caller-visible form of `InsufficientCapacity`: the category is full.
    /// Routine business rejection, not a system fault.
    #[error("sold out: requested {requested}, remaining {remaining}")]
    SoldOut { requested: u32, remaining: u32 },

    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    /// Transient persistence failure. Safe to retry: `try_reserve` has no
    /// side effect on failure and `release` is idempotent.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Только Storage имеет смысл ретраить; остальное — терминальные ответы.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
