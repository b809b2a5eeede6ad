use std::env;

use chrono::{FixedOffset, Offset, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_audience: String,

    pub store_backend: StoreBackend,

    // Calendar used for "today" in streak math
    pub streak_utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Self {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };

        Self {
            // Only required for the Postgres backend
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".into()),

            store_backend,

            streak_utc_offset_minutes: env::var("STREAK_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .expect("STREAK_UTC_OFFSET_MINUTES must be a number"),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Offset used to turn "now" into a calendar day. Out-of-range values fall back to UTC.
    pub fn streak_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.streak_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}
