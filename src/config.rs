use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_queue_size: usize,
    pub alert_buffer_size: usize,
    /// Veto threshold for the anti-spoofing speed check.
    pub max_speed_kmh: f64,
    pub oracle_base_url: String,
    /// Server-held oracle credential. Absent means route effects degrade to
    /// a failed-precondition error; the server still starts.
    pub oracle_token: Option<String>,
    pub oracle_timeout_ms: u64,
    /// Shared bearer token required by the callable route endpoints.
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_queue_size: parse_or_default("EVENT_QUEUE_SIZE", 1024)?,
            alert_buffer_size: parse_or_default("ALERT_BUFFER_SIZE", 1024)?,
            max_speed_kmh: parse_or_default("MAX_SPEED_KMH", 200.0)?,
            oracle_base_url: env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| "https://api.mapbox.com".to_string()),
            oracle_token: env::var("ORACLE_TOKEN").ok(),
            oracle_timeout_ms: parse_or_default("ORACLE_TIMEOUT_MS", 5_000)?,
            api_token: env::var("API_TOKEN").ok(),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
