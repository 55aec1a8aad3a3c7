//! Configuration loader

use std::net::IpAddr;
use std::path::Path;

use rhinomcp_protocol::MAX_MESSAGE_SIZE;
use rhinomcp_utils::{config_file, Result, RhinoMcpError};

use super::AppConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| RhinoMcpError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| RhinoMcpError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        check_loopback("server.host", &config.server.host)?;
        check_loopback("bridge.host", &config.bridge.host)?;

        if config.bridge.port == 0 {
            return Err(RhinoMcpError::config("bridge.port must not be 0"));
        }

        let bridge = &config.bridge;
        if bridge.connect_timeout_secs == 0
            || bridge.read_timeout_secs == 0
            || bridge.idle_log_interval_secs == 0
        {
            return Err(RhinoMcpError::config(
                "bridge timeouts and idle_log_interval_secs must be at least 1",
            ));
        }

        // The bridge polls stdin at this interval after EOF
        if bridge.eof_retry_delay_ms == 0 {
            return Err(RhinoMcpError::config("bridge.eof_retry_delay_ms must be at least 1"));
        }

        if bridge.read_timeout_secs < bridge.connect_timeout_secs {
            return Err(RhinoMcpError::config(
                "read_timeout_secs must be at least connect_timeout_secs",
            ));
        }

        let max = config.limits.max_message_bytes;
        if max == 0 || max > MAX_MESSAGE_SIZE {
            return Err(RhinoMcpError::config(format!(
                "max_message_bytes must be between 1 and {}",
                MAX_MESSAGE_SIZE
            )));
        }

        Ok(())
    }

    /// Load from an explicit path (or the default location) and validate
    pub fn load_and_validate(path: Option<&Path>) -> Result<AppConfig> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load()?,
        };
        Self::validate(&config)?;
        Ok(config)
    }
}

fn check_loopback(field: &str, host: &str) -> Result<()> {
    let loopback = host == "localhost"
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false);

    if loopback {
        Ok(())
    } else {
        Err(RhinoMcpError::config(format!(
            "{} must be a loopback address, got '{}'",
            field, host
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file() {
        let config = ConfigLoader::load();
        assert!(config.is_ok());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
            [server]
            port = 9900
            open_document = false

            [limits]
            max_message_bytes = 4096
            "#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9900);
        assert!(!config.server.open_document);
        assert_eq!(config.limits.max_message_bytes, 4096);
        assert_eq!(config.bridge.port, 9876);
    }

    #[test]
    fn test_load_from_missing_path_is_file_read_error() {
        let dir = tempdir().unwrap();
        let result = ConfigLoader::load_from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(RhinoMcpError::FileRead { .. })));
    }

    #[test]
    fn test_load_and_validate_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bridge]\nport = 0\n").unwrap();

        assert!(ConfigLoader::load_and_validate(Some(&path)).is_err());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = ConfigLoader::parse("invalid { toml", Path::new("test.toml"));
        assert!(matches!(result, Err(RhinoMcpError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(ConfigLoader::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_accepts_loopback_forms() {
        let mut config = AppConfig::default();
        config.server.host = "localhost".into();
        config.bridge.host = "::1".into();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_loopback() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".into();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_validate_zero_bridge_port() {
        let mut config = AppConfig::default();
        config.bridge.port = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = AppConfig::default();
        config.bridge.connect_timeout_secs = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_zero_eof_retry_delay() {
        let mut config = AppConfig::default();
        config.bridge.eof_retry_delay_ms = 0;
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("eof_retry_delay_ms"));

        config.bridge.eof_retry_delay_ms = 1;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_read_shorter_than_connect() {
        let mut config = AppConfig::default();
        config.bridge.connect_timeout_secs = 20;
        config.bridge.read_timeout_secs = 10;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_message_limit() {
        let mut config = AppConfig::default();
        config.limits.max_message_bytes = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        config.limits.max_message_bytes = MAX_MESSAGE_SIZE + 1;
        assert!(ConfigLoader::validate(&config).is_err());

        config.limits.max_message_bytes = MAX_MESSAGE_SIZE;
        assert!(ConfigLoader::validate(&config).is_ok());
    }
}
