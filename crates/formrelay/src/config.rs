//! Configuration management for formrelay.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "formrelay";

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_PAYLOAD: usize = 65_507;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FORMRELAY_`)
/// 2. TOML config file at `~/.config/formrelay/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP front end configuration.
    pub http: HttpConfig,
    /// Datagram relay configuration.
    pub relay: RelayConfig,
    /// Record storage configuration.
    pub storage: StorageConfig,
    /// Static content configuration.
    pub web: WebConfig,
}

/// HTTP front end configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the HTTP server binds to.
    pub host: IpAddr,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Open the index page in the default browser at startup.
    pub open_browser: bool,
    /// Maximum accepted request body size in bytes.
    pub body_limit: usize,
}

/// Datagram relay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Loopback address the ingest loop listens on.
    pub host: IpAddr,
    /// Port the ingest loop listens on.
    pub port: u16,
    /// Largest payload, in bytes, carried by one datagram.
    pub max_payload: usize,
}

/// Record storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the JSON record file.
    pub path: PathBuf,
    /// Print the record table to stdout after every stored submission.
    pub echo_table: bool,
}

/// Static content configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Directory holding `index.html`, `message.html`, `error.html` and
    /// any other static files.
    pub root: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            open_browser: true,
            body_limit: 64 * 1024,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            max_payload: 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storage").join("data.json"),
            echo_table: true,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FORMRELAY_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FORMRELAY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.relay.host.is_loopback() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "relay host {} is not a loopback address",
                    self.relay.host
                ),
            });
        }

        if self.relay.max_payload == 0 || self.relay.max_payload > MAX_DATAGRAM_PAYLOAD {
            return Err(Error::ConfigValidation {
                message: format!(
                    "max_payload must be between 1 and {MAX_DATAGRAM_PAYLOAD}, got {}",
                    self.relay.max_payload
                ),
            });
        }

        if self.http.body_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "body_limit must be greater than 0".to_string(),
            });
        }

        if self.storage.path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage path must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Address the ingest loop receives datagrams on.
    #[must_use]
    pub fn relay_addr(&self) -> SocketAddr {
        SocketAddr::new(self.relay.host, self.relay.port)
    }

    /// URL opened in the browser for an HTTP server listening on `port`.
    #[must_use]
    pub fn browser_url(port: u16) -> String {
        format!("http://127.0.0.1:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.http.port, 3000);
        assert!(config.http.open_browser);
        assert_eq!(config.relay.port, 5000);
        assert_eq!(config.relay.max_payload, 1024);
        assert!(config.storage.echo_table);
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();
        assert_eq!(storage.path, PathBuf::from("storage").join("data.json"));
    }

    #[test]
    fn test_default_web_config() {
        assert_eq!(WebConfig::default().root, PathBuf::from("public"));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_non_loopback_relay() {
        let mut config = Config::default();
        config.relay.host = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("loopback"));
    }

    #[test]
    fn test_validate_ipv6_loopback_relay() {
        let mut config = Config::default();
        config.relay.host = "::1".parse().unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_payload() {
        let mut config = Config::default();
        config.relay.max_payload = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_payload"));
    }

    #[test]
    fn test_validate_oversized_max_payload() {
        let mut config = Config::default();
        config.relay.max_payload = MAX_DATAGRAM_PAYLOAD + 1;
        assert!(config.validate().is_err());

        config.relay.max_payload = MAX_DATAGRAM_PAYLOAD;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_body_limit() {
        let mut config = Config::default();
        config.http.body_limit = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("body_limit"));
    }

    #[test]
    fn test_validate_empty_storage_path() {
        let mut config = Config::default();
        config.storage.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_addresses() {
        let config = Config::default();
        assert_eq!(config.http_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.relay_addr().to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn test_browser_url() {
        assert_eq!(Config::browser_url(3000), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("formrelay"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[http]\nport = 8080\nopen_browser = false\n\n[relay]\nmax_payload = 512\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.http.port, 8080);
        assert!(!config.http.open_browser);
        assert_eq!(config.relay.max_payload, 512);
        assert_eq!(config.relay.port, 5000);
    }

    #[test]
    fn test_load_from_invalid_toml_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[relay]\nhost = \"192.168.1.10\"\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("max_payload"));
        assert!(json.contains("echo_table"));
    }

    #[test]
    fn test_relay_config_deserialize() {
        let json = r#"{"port": 6000}"#;
        let relay: RelayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(relay.port, 6000);
        assert_eq!(relay.max_payload, 1024);
    }
}
