use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::services::DEFAULT_LOW_RATING_THRESHOLD;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    /// Process-local store, lost on restart
    Memory,
}

/// Server configuration, read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Overrides the database named in `database_url`
    pub database_name: Option<String>,
    pub store_backend: StoreBackend,
    pub cors_origins: Vec<String>,
    pub low_rating_threshold: i32,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let store_backend = match get("STORE_BACKEND", "mongo").to_lowercase().as_str() {
            "mongo" | "mongodb" => StoreBackend::Mongo,
            "memory" | "in-memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port: parse("PORT", &get("PORT", "3001"))?,
            database_url: get("DATABASE_URL", "mongodb://127.0.0.1:27017/LMS"),
            database_name: lookup("DATABASE_NAME").filter(|s| !s.trim().is_empty()),
            store_backend,
            cors_origins: get("CORS_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            low_rating_threshold: parse(
                "LOW_RATING_THRESHOLD",
                &get("LOW_RATING_THRESHOLD", &DEFAULT_LOW_RATING_THRESHOLD.to_string()),
            )?,
            seed_demo_data: parse_bool("SEED_DEMO_DATA", &get("SEED_DEMO_DATA", "false"))?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
