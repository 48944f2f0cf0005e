//! Service configuration, loaded from environment variables.
//!
//! | Variable                 | Default | Meaning                                  |
//! |--------------------------|---------|------------------------------------------|
//! | `ORDER_CALL_TIMEOUT_MS`  | `2000`  | bound for each outbound call, in ms      |
//! | `ORDER_CHANNEL_CAPACITY` | `32`    | request buffer of every actor            |
//! | `DATABASE_URL`           | unset   | PostgreSQL order store (feature `postgres`) |

use crate::order_service::OrderServiceConfig;
use std::time::Duration;

pub const CALL_TIMEOUT_VAR: &str = "ORDER_CALL_TIMEOUT_MS";
pub const CHANNEL_CAPACITY_VAR: &str = "ORDER_CHANNEL_CAPACITY";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Configuration error.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// Environment variable is set but its value cannot be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub order: OrderServiceConfig,
    pub channel_capacity: usize,
    pub database_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            order: OrderServiceConfig::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            database_url: None,
        }
    }
}

impl ServiceConfig {
    /// Reads the process environment. Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let call_timeout = parse_positive(&var, CALL_TIMEOUT_VAR)?
            .map_or(defaults.order.call_timeout, Duration::from_millis);
        let channel_capacity = parse_positive(&var, CHANNEL_CAPACITY_VAR)?
            .map_or(Ok(defaults.channel_capacity), |n| {
                usize::try_from(n).map_err(|_| invalid(CHANNEL_CAPACITY_VAR, &n.to_string(), "too large"))
            })?;
        let database_url = var(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty());

        Ok(Self {
            order: OrderServiceConfig { call_timeout },
            channel_capacity,
            database_url,
        })
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = var(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid(key, &raw, "must be greater than zero")),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(invalid(key, &raw, &e.to_string())),
    }
}
