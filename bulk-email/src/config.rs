use crate::error::{BulkEmailError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Bulk email store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkEmailConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub log_level: String,
}

impl Default for BulkEmailConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl BulkEmailConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let max_connections = parse_or(
            &lookup,
            "BULK_EMAIL_DB_MAX_CONNECTIONS",
            defaults.max_connections,
        )?;
        let min_connections = parse_or(
            &lookup,
            "BULK_EMAIL_DB_MIN_CONNECTIONS",
            defaults.min_connections,
        )?;
        let acquire_timeout_secs = parse_or(
            &lookup,
            "BULK_EMAIL_DB_ACQUIRE_TIMEOUT_SECS",
            defaults.acquire_timeout_secs,
        )?;

        let log_level = lookup("BULK_EMAIL_LOG_LEVEL").unwrap_or(defaults.log_level);

        let config = Self {
            database_url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_database_url<S: Into<String>>(mut self, url: S) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(BulkEmailError::Config(
                "BULK_EMAIL_DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(BulkEmailError::Config(format!(
                "min connections ({}) exceeds max connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    /// Connection string, required by the PostgreSQL store
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| BulkEmailError::Config("DATABASE_URL is not set".to_string()))
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
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
            .map_err(|_| BulkEmailError::Config(format!("{} has invalid value {:?}", key, raw))),
        None => Ok(default),
    }
}
