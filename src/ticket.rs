//! ticket.rs
//!
//! Выпуск номеров билетов: id сеанса + монотонный счетчик + случайный
//! суффикс. Номер уникален даже при конкурентном выпуске и никогда не
//! переиспользуется, в том числе после отмены брони.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub struct TicketIssuer {
    prefix: String,
    counter: AtomicU64,
}

impl TicketIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Формат: `PREFIX-<slot>-<seq:06>-<rand8>`.
    pub fn issue(&self, slot_id: i64) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}-{:06}-{}", self.prefix, slot_id, seq, &suffix[..8])
    }
}
