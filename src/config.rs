//! Configuration management for contact search.
//!
//! Settings come from environment variables, optionally seeded from a `.env` file.
//! Nothing here writes to stdout, which the binary reserves for results.

use crate::error::{ConfigError, ConfigResult};
use std::env;

/// Configuration for the contact search binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file (default: "contacts.db")
    pub database_path: String,

    /// Whether results and deal values are cached (default: true)
    pub cache_enabled: bool,

    /// Absolute lifetime of a cached result page in seconds (default: 300)
    pub result_cache_ttl_secs: u64,

    /// Idle window of a cached result page in seconds (default: 60)
    /// Must not exceed the absolute lifetime
    pub result_cache_sliding_secs: u64,

    /// Lifetime of a memoized deal value in seconds (default: 3600)
    pub deal_value_cache_ttl_secs: u64,

    /// Upper bound for requested page sizes (default: 1000)
    pub max_page_size: u32,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CONTACT_SEARCH_DATABASE_PATH`: SQLite file (default: contacts.db)
    /// - `CONTACT_SEARCH_CACHE_ENABLED`: `true`/`false` (default: true)
    /// - `CONTACT_SEARCH_RESULT_CACHE_TTL_SECS`: Result TTL (default: 300)
    /// - `CONTACT_SEARCH_RESULT_CACHE_SLIDING_SECS`: Result idle window (default: 60)
    /// - `CONTACT_SEARCH_DEAL_VALUE_CACHE_TTL_SECS`: Deal value TTL (default: 3600)
    /// - `CONTACT_SEARCH_MAX_PAGE_SIZE`: Page size cap (default: 1000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // dotenvy stays silent when there is no .env file
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        let database_path = env::var("CONTACT_SEARCH_DATABASE_PATH")
            .unwrap_or(defaults.database_path);
        if database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "CONTACT_SEARCH_DATABASE_PATH".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        let cache_enabled = Self::parse_env_bool("CONTACT_SEARCH_CACHE_ENABLED", true)?;
        let result_cache_ttl_secs = Self::parse_env_u64(
            "CONTACT_SEARCH_RESULT_CACHE_TTL_SECS",
            defaults.result_cache_ttl_secs,
        )?;
        let result_cache_sliding_secs = Self::parse_env_u64(
            "CONTACT_SEARCH_RESULT_CACHE_SLIDING_SECS",
            defaults.result_cache_sliding_secs,
        )?;
        let deal_value_cache_ttl_secs = Self::parse_env_u64(
            "CONTACT_SEARCH_DEAL_VALUE_CACHE_TTL_SECS",
            defaults.deal_value_cache_ttl_secs,
        )?;
        let max_page_size =
            Self::parse_env_u32("CONTACT_SEARCH_MAX_PAGE_SIZE", defaults.max_page_size)?;

        if result_cache_sliding_secs > result_cache_ttl_secs {
            return Err(ConfigError::InvalidValue {
                var: "CONTACT_SEARCH_RESULT_CACHE_SLIDING_SECS".to_string(),
                reason: format!(
                    "Must not exceed CONTACT_SEARCH_RESULT_CACHE_TTL_SECS ({})",
                    result_cache_ttl_secs
                ),
            });
        }

        if max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CONTACT_SEARCH_MAX_PAGE_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Config {
            database_path,
            cache_enabled,
            result_cache_ttl_secs,
            result_cache_sliding_secs,
            deal_value_cache_ttl_secs,
            max_page_size,
            log_level,
        })
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as u32 with a default value.
    fn parse_env_u32(var_name: &str, default: u32) -> ConfigResult<u32> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as a boolean with a default value.
    ///
    /// Accepts `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitively.
    fn parse_env_bool(var_name: &str, default: bool) -> ConfigResult<bool> {
        match env::var(var_name) {
            Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    var: var_name.to_string(),
                    reason: format!("Must be true or false, got: {}", val),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "contacts.db".to_string(),
            cache_enabled: true,
            result_cache_ttl_secs: 300,
            result_cache_sliding_secs: 60,
            deal_value_cache_ttl_secs: 3600,
            max_page_size: 1000,
            log_level: "info".to_string(),
        }
    }
}
