//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use quizarena_shared::constants::{APP_NAME, DEFAULT_HTTP_PORT};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./quizarena.db`
    pub database_path: PathBuf,

    /// Lifetime of a login session in days.
    /// Env: `SESSION_TTL_DAYS`
    /// Default: `30`
    pub session_ttl_days: i64,

    /// Whether the session cookie carries the `Secure` attribute.
    /// Env: `COOKIE_SECURE` (true/false)
    /// Default: `false`
    pub cookie_secure: bool,

    /// Whether new accounts can be created.
    /// Env: `REGISTRATION_OPEN` (true/false)
    /// Default: `true`
    pub registration_open: bool,

    /// Human-readable name reported by `/health`.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Quiz Arena"`
    pub instance_name: String,

    /// Sustained register/login attempts per second per client IP.
    /// Env: `AUTH_RATE_PER_SEC`
    /// Default: `1.0`
    pub auth_rate_per_sec: f64,

    /// Burst of register/login attempts allowed per client IP.
    /// Env: `AUTH_RATE_BURST`
    /// Default: `10`
    pub auth_rate_burst: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./quizarena.db"),
            session_ttl_days: 30,
            cookie_secure: false,
            registration_open: true,
            instance_name: APP_NAME.to_string(),
            auth_rate_per_sec: 1.0,
            auth_rate_burst: 10.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(val) = var("SESSION_TTL_DAYS") {
            match val.parse::<i64>() {
                Ok(days) if days > 0 => config.session_ttl_days = days,
                _ => tracing::warn!(value = %val, "Invalid SESSION_TTL_DAYS, using default"),
            }
        }

        if let Some(val) = var("COOKIE_SECURE") {
            config.cookie_secure = val == "true" || val == "1";
        }

        if let Some(val) = var("REGISTRATION_OPEN") {
            config.registration_open = val != "false" && val != "0";
        }

        if let Some(name) = var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Some(val) = var("AUTH_RATE_PER_SEC") {
            match val.parse::<f64>() {
                Ok(rate) if rate > 0.0 => config.auth_rate_per_sec = rate,
                _ => tracing::warn!(value = %val, "Invalid AUTH_RATE_PER_SEC, using default"),
            }
        }

        if let Some(val) = var("AUTH_RATE_BURST") {
            match val.parse::<f64>() {
                Ok(burst) if burst >= 1.0 => config.auth_rate_burst = burst,
                _ => tracing::warn!(value = %val, "Invalid AUTH_RATE_BURST, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.session_ttl_days, 30);
        assert!(config.registration_open);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/qa.db"),
            ("SESSION_TTL_DAYS", "7"),
            ("COOKIE_SECURE", "true"),
            ("REGISTRATION_OPEN", "false"),
            ("AUTH_RATE_BURST", "3"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, PathBuf::from("/tmp/qa.db"));
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
        assert!(config.cookie_secure);
        assert!(!config.registration_open);
        assert_eq!(config.auth_rate_burst, 3.0);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_map(&[
            ("HTTP_ADDR", "not an address"),
            ("SESSION_TTL_DAYS", "-4"),
            ("AUTH_RATE_PER_SEC", "fast"),
        ]);
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.session_ttl_days, 30);
        assert_eq!(config.auth_rate_per_sec, 1.0);
    }
}
