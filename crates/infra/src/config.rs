//! Configuration loading and representation.
//!
//! All settings come from the process environment (a `.env` file is loaded by the
//! binary before this runs). Every value has a default suitable for local development.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// libpq-style SSL mode (`disable`, `prefer`, `require`, `verify-ca`, `verify-full`).
    pub ssl_mode: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            name: "product_catalog".to_string(),
            ssl_mode: "disable".to_string(),
            max_connections: 10,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn ssl_mode(&self) -> Result<PgSslMode, ConfigError> {
        self.ssl_mode
            .parse::<PgSslMode>()
            .map_err(|e| ConfigError::invalid("DATABASE_SSL_MODE", e.to_string()))
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Connection options for the pool. Carries the password: do not log.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Use Postgres-backed stores instead of the in-memory ones.
    pub use_persistent_stores: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_defaults = DatabaseConfig::default();
        let server_defaults = ServerConfig::default();

        let database = DatabaseConfig {
            host: lookup("DATABASE_HOST").unwrap_or(db_defaults.host),
            port: parse_or(&lookup, "DATABASE_PORT", db_defaults.port)?,
            user: lookup("DATABASE_USER").unwrap_or(db_defaults.user),
            password: lookup("DATABASE_PASSWORD").unwrap_or(db_defaults.password),
            name: lookup("DATABASE_NAME").unwrap_or(db_defaults.name),
            ssl_mode: lookup("DATABASE_SSL_MODE").unwrap_or(db_defaults.ssl_mode),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", db_defaults.max_connections)?,
            acquire_timeout_ms: parse_or(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_MS",
                db_defaults.acquire_timeout_ms,
            )?,
        };
        // Fail at startup rather than on first connect.
        database.ssl_mode()?;

        // GRPC_PORT is the historical name of the listening port.
        let port = match lookup("SERVER_PORT") {
            Some(_) => parse_or(&lookup, "SERVER_PORT", server_defaults.port)?,
            None => parse_or(&lookup, "GRPC_PORT", server_defaults.port)?,
        };
        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or(server_defaults.host),
            port,
        };

        let use_persistent_stores = parse_or(&lookup, "USE_PERSISTENT_STORES", false)?;

        Ok(Self {
            database,
            server,
            use_persistent_stores,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::invalid(key, format!("{raw:?}: {e}"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8080");
        assert!(!cfg.use_persistent_stores);
    }

    #[test]
    fn reads_database_settings() {
        let cfg = config_from(&[
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_PORT", "6543"),
            ("DATABASE_USER", "catalog"),
            ("DATABASE_PASSWORD", "secret"),
            ("DATABASE_NAME", "catalog_db"),
            ("DATABASE_SSL_MODE", "require"),
            ("USE_PERSISTENT_STORES", "true"),
        ])
        .unwrap();

        assert_eq!(cfg.database.host, "db.internal");
        assert_eq!(cfg.database.port, 6543);
        assert_eq!(cfg.database.user, "catalog");
        assert_eq!(cfg.database.name, "catalog_db");
        assert!(matches!(cfg.database.ssl_mode().unwrap(), PgSslMode::Require));
        assert!(cfg.use_persistent_stores);
    }

    #[test]
    fn server_port_falls_back_to_grpc_port() {
        let cfg = config_from(&[("GRPC_PORT", "50051")]).unwrap();
        assert_eq!(cfg.server.port, 50051);

        let cfg = config_from(&[("GRPC_PORT", "50051"), ("SERVER_PORT", "9000")]).unwrap();
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("DATABASE_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_PORT", .. }));
    }

    #[test]
    fn rejects_unknown_ssl_mode() {
        let err = config_from(&[("DATABASE_SSL_MODE", "sometimes")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_SSL_MODE", .. }));
    }
}
