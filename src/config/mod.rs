use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек движка
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub rust_log: String,
}

// Настройки бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Верхняя граница мест в одной брони; защита от опечаток клиента.
    pub max_seats_per_booking: u32,
    /// Префикс номеров билетов, например "SHOW".
    pub ticket_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            app: AppConfig {
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "show_booking=debug".to_string()),
            },
            booking: BookingConfig {
                max_seats_per_booking: env::var("MAX_SEATS_PER_BOOKING")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("MAX_SEATS_PER_BOOKING must be a valid number"),
                ticket_prefix: env::var("TICKET_PREFIX")
                    .unwrap_or_else(|_| "SHOW".to_string()),
            },
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_seats_per_booking: 10,
            ticket_prefix: "SHOW".to_string(),
        }
    }
}
