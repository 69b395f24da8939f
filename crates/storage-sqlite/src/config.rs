//! Environment-driven storage configuration.

use std::str::FromStr;
use std::time::Duration;

use snippetbox_core::errors::{Error, Result};

use crate::db::db_file_in;

const DEFAULT_DATA_DIR: &str = "./db";
const DEFAULT_POOL_MAX_SIZE: u32 = 8;
const DEFAULT_POOL_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_path: String,
    pub pool_max_size: u32,
    pub pool_timeout: Duration,
    pub busy_timeout: Duration,
}

impl StorageConfig {
    /// Default settings for a database file at `db_path`.
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            pool_timeout: Duration::from_millis(DEFAULT_POOL_TIMEOUT_MS),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Reads `SNIPPETBOX_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup` alone; the process environment is not read.
    ///
    /// The path falls back to `DATABASE_URL`, then `./db/snippetbox.db`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let db_path = non_empty("SNIPPETBOX_DB_PATH")
            .or_else(|| non_empty("DATABASE_URL"))
            .unwrap_or_else(|| db_file_in(DEFAULT_DATA_DIR));
        let pool_max_size: u32 =
            parse_or(&lookup, "SNIPPETBOX_POOL_MAX_SIZE", DEFAULT_POOL_MAX_SIZE)?;
        if pool_max_size == 0 {
            return Err(Error::InvalidConfigValue(
                "SNIPPETBOX_POOL_MAX_SIZE must be at least 1".to_string(),
            ));
        }
        let pool_timeout_ms =
            parse_or(&lookup, "SNIPPETBOX_POOL_TIMEOUT_MS", DEFAULT_POOL_TIMEOUT_MS)?;
        let busy_timeout_ms =
            parse_or(&lookup, "SNIPPETBOX_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS)?;

        Ok(Self {
            db_path,
            pool_max_size,
            pool_timeout: Duration::from_millis(pool_timeout_ms),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfigValue(format!("{key}={raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            ("SNIPPETBOX_DB_PATH", "/var/lib/snippetbox/app.db"),
            ("SNIPPETBOX_POOL_MAX_SIZE", "4"),
            ("SNIPPETBOX_POOL_TIMEOUT_MS", "1500"),
            ("SNIPPETBOX_BUSY_TIMEOUT_MS", " 250 "),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "/var/lib/snippetbox/app.db");
        assert_eq!(config.pool_max_size, 4);
        assert_eq!(config.pool_timeout, Duration::from_millis(1500));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_defaults_match_new() {
        let config = StorageConfig::from_lookup(lookup_from(&[(
            "SNIPPETBOX_DB_PATH",
            "snippets.db",
        )]))
        .unwrap();
        assert_eq!(config, StorageConfig::new("snippets.db"));
    }

    #[test]
    fn test_database_url_comes_from_lookup() {
        let config =
            StorageConfig::from_lookup(lookup_from(&[("DATABASE_URL", "/srv/snippets.db")]))
                .unwrap();
        assert_eq!(config.db_path, "/srv/snippets.db");

        let config = StorageConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "/srv/snippets.db"),
            ("SNIPPETBOX_DB_PATH", "/var/lib/snippetbox/app.db"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/var/lib/snippetbox/app.db");
    }

    #[test]
    fn test_default_path_ignores_process_environment() {
        let config = StorageConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, db_file_in(DEFAULT_DATA_DIR));
        assert!(config.db_path.ends_with("snippetbox.db"));
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = StorageConfig::from_lookup(lookup_from(&[("SNIPPETBOX_POOL_MAX_SIZE", "many")]))
            .unwrap_err();
        match err {
            Error::InvalidConfigValue(msg) => assert!(msg.contains("SNIPPETBOX_POOL_MAX_SIZE")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let err = StorageConfig::from_lookup(lookup_from(&[("SNIPPETBOX_POOL_MAX_SIZE", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue(_)));
    }
}
