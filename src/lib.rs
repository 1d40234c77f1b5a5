pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod services;
pub mod ticket;

pub use catalog::{CatalogStore, InMemoryCatalog};
pub use error::{BookingError, Result};
pub use ledger::{AvailabilityLedger, ReservationToken};
pub use services::booking::{BookSeatsRequest, BookingEngine};

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Shared state для всего движка бронирования
pub struct BookingSystem {
    pub engine: services::booking::BookingEngine,
    pub config: config::Config,
}

impl BookingSystem {
    pub fn new(catalog: Arc<dyn catalog::CatalogStore>, config: config::Config) -> Self {
        let engine = services::booking::BookingEngine::new(catalog, config.booking.clone());
        Self { engine, config }
    }
}

/// Подписчик трейсинга в том же виде, в каком его поднимал бы сервисный
/// бинарь: фильтр из `RUST_LOG` (через конфиг) плюс fmt-слой.
pub fn init_tracing(config: &config::Config) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
