//! Configuration schema structs

use std::time::Duration;

use rhinomcp_protocol::{DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bridge: BridgeConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Point both sides of the TCP hop at the same port
    pub fn override_port(&mut self, port: u16) {
        self.server.port = port;
        self.bridge.port = port;
    }
}

/// Socket command server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (loopback only)
    pub host: String,
    /// Listen port; 0 picks an ephemeral port
    pub port: u16,
    /// Start the in-process host with an active document (default: true)
    pub open_document: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            open_document: true,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// MCP bridge settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Command server host to relay to
    pub host: String,
    /// Command server port to relay to
    pub port: u16,
    /// TCP connect timeout (default: 10)
    pub connect_timeout_secs: u64,
    /// Reply read timeout (default: 30)
    pub read_timeout_secs: u64,
    /// Idle interval between liveness log lines on stdin (default: 10)
    pub idle_log_interval_secs: u64,
    /// Pause after stdin EOF before polling again (default: 1000)
    pub eof_retry_delay_ms: u64,
    /// Time outstanding tool calls get to finish after shutdown (default: 5)
    pub shutdown_grace_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            idle_log_interval_secs: 10,
            eof_retry_delay_ms: 1000,
            shutdown_grace_secs: 5,
        }
    }
}

impl BridgeConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn idle_log_interval(&self) -> Duration {
        Duration::from_secs(self.idle_log_interval_secs)
    }

    pub fn eof_retry_delay(&self) -> Duration {
        Duration::from_millis(self.eof_retry_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Wire limits shared by both sides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted TCP frame in bytes (default: 1 MiB)
    pub max_message_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "127.0.0.1:9876");
        assert_eq!(config.bridge.addr(), "127.0.0.1:9876");
        assert!(config.server.open_document);
        assert_eq!(config.bridge.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.bridge.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.bridge.eof_retry_delay(), Duration::from_millis(1000));
        assert_eq!(config.limits.max_message_bytes, 1_048_576);
    }

    #[test]
    fn test_override_port() {
        let mut config = AppConfig::default();
        config.override_port(12000);
        assert_eq!(config.server.port, 12000);
        assert_eq!(config.bridge.port, 12000);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [bridge]
            read_timeout_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.bridge.read_timeout_secs, 60);
        assert_eq!(config.bridge.connect_timeout_secs, 10);
        assert_eq!(config.server, ServerConfig::default());
    }
}
