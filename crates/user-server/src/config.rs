//! Server configuration.
//!
//! The service has no configuration file and reads no environment
//! variables: every value below is fixed at its default. Tests build their
//! own `Config` to point the database at a temporary directory.

use std::net::{IpAddr, Ipv4Addr};

/// Top-level server configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server network settings.
    pub server: ServerConfig,

    /// Database settings.
    pub database: DatabaseConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: IpAddr,

    /// Port to listen on.
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, relative to the working directory.
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "user_server=debug,info").
    pub level: String,

    /// Whether to output logs in JSON format.
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8081,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let settings = user_db::DbRuntimeSettings::default();
        Self {
            path: "users.db".to_string(),
            busy_timeout_ms: settings.busy_timeout_ms,
            pool_max_size: settings.pool_max_size,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Connection tunables in the form the storage layer expects.
    pub fn runtime_settings(&self) -> user_db::DbRuntimeSettings {
        user_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_deployment() {
        let config = Config::default();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.database.path, "users.db");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }
}
