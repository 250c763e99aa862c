//! services/api/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub authorized_emails: Vec<String>,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
    pub session_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    ///
    /// Every missing required variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // --- Required settings ---
        let mut missing = Vec::new();
        let database_url = var("DATABASE_URL");
        if database_url.is_none() {
            missing.push("DATABASE_URL".to_string());
        }
        let authorized_emails: Vec<String> = var("AUTHORIZED_EMAILS")
            .map(|list| {
                list.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if authorized_emails.is_empty() {
            missing.push("AUTHORIZED_EMAILS".to_string());
        }
        let Some(database_url) = database_url.filter(|_| missing.is_empty()) else {
            return Err(ConfigError::Missing(missing));
        };

        // --- Server settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", var("MAX_UPLOAD_BYTES"), 10 * 1024 * 1024)?;
        let session_ttl_days = parse_or("SESSION_TTL_DAYS", var("SESSION_TTL_DAYS"), 30)?;
        if session_ttl_days < 1 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            authorized_emails,
            cors_origin,
            max_upload_bytes,
            session_ttl_days,
        })
    }

    /// True when the in-process store was requested instead of PostgreSQL.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory:")
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn reports_every_missing_variable() {
        let err = Config::from_lookup(lookup(&[("AUTHORIZED_EMAILS", " , ")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["DATABASE_URL".to_string(), "AUTHORIZED_EMAILS".to_string()])
        );
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: DATABASE_URL, AUTHORIZED_EMAILS"
        );
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("AUTHORIZED_EMAILS", "a@example.edu, b@example.edu"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.authorized_emails, vec!["a@example.edu", "b@example.edu"]);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.session_ttl_days, 30);
        assert!(config.uses_memory_store());
    }

    #[test]
    fn rejects_malformed_values() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("AUTHORIZED_EMAILS", "a@example.edu"),
            ("MAX_UPLOAD_BYTES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "MAX_UPLOAD_BYTES"));

        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("AUTHORIZED_EMAILS", "a@example.edu"),
            ("RUST_LOG", "chatty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "RUST_LOG"));
    }
}
