//! # Application Configuration
//!
//! Settings read once at startup, from TOML or from code.
//!
//! ```toml
//! is_production = false
//! address = "0.0.0.0:8080"
//! spoof_server_header = true
//! server_header_value = "nginx"
//! ```

use crate::error::Result;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

/// Application-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hide fault details behind a generic message
    pub is_production: bool,
    /// Send a fake `Server` header with every response
    pub spoof_server_header: bool,
    /// Value of the spoofed `Server` header
    pub server_header_value: String,
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Max request body size in bytes
    pub max_body_size: usize,
    /// How long in-flight connections may drain on shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            is_production: true,
            spoof_server_header: false,
            server_header_value: "openresty".to_string(),
            address: ([127, 0, 0, 1], 8000).into(),
            max_body_size: 1024 * 1024,
            shutdown_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config`
    /// if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), production = config.is_production, "Configuration loaded");
        Ok(config)
    }

    /// Development settings: raw fault text in 500 responses
    #[must_use]
    pub fn development() -> Self {
        Self {
            is_production: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.is_production);
        assert!(!config.spoof_server_header);
        assert_eq!(config.server_header_value, "openresty");
        assert_eq!(config.address.port(), 8000);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            is_production = false
            address = "0.0.0.0:9000"
            "#,
        )
        .unwrap();

        assert!(!config.is_production);
        assert_eq!(config.address.port(), 9000);
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert_eq!(config.server_header_value, "openresty");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml_str("is_production = \"maybe\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/routekit.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
