// Service configuration
//
// Loaded from environment variables (after .env) with defaults for
// everything except the database URL of the postgres backend.

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::pricing::cache::DEFAULT_TTL;

/// Where documents are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue("STORAGE_BACKEND".to_string())),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// Required when `storage_backend` is postgres
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Optional JSON seed for the memory backend
    pub seed_file: Option<String>,
    pub rate_cache_ttl: Duration,
    pub rate_cache_sweep_interval: Duration,
    /// Agent commission used when no agent applies, in percent
    pub default_agent_commission_rate: Decimal,
    pub max_page_size: u32,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        let config = AppConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 8080)?,
            storage_backend,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5)?,
            seed_file: get("SEED_FILE"),
            rate_cache_ttl: Duration::from_secs(parse_or(
                "RATE_CACHE_TTL_SECS",
                get("RATE_CACHE_TTL_SECS"),
                DEFAULT_TTL.as_secs(),
            )?),
            rate_cache_sweep_interval: Duration::from_secs(parse_or(
                "RATE_CACHE_SWEEP_SECS",
                get("RATE_CACHE_SWEEP_SECS"),
                60,
            )?),
            default_agent_commission_rate: parse_or(
                "DEFAULT_AGENT_COMMISSION_RATE",
                get("DEFAULT_AGENT_COMMISSION_RATE"),
                Decimal::ZERO,
            )?,
            max_page_size: parse_or("MAX_PAGE_SIZE", get("MAX_PAGE_SIZE"), 100)?,
        };

        if config.storage_backend == StorageBackend::Postgres && config.database_url.is_none() {
            return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
        }
        if config.default_agent_commission_rate < Decimal::ZERO
            || config.default_agent_commission_rate > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::InvalidValue("DEFAULT_AGENT_COMMISSION_RATE".to_string()));
        }
        if config.max_page_size == 0 {
            return Err(ConfigError::InvalidValue("MAX_PAGE_SIZE".to_string()));
        }
        if config.rate_cache_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue("RATE_CACHE_SWEEP_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
