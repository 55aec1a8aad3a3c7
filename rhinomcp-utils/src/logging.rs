//! Logging infrastructure for rhinomcp
//!
//! Provides unified logging setup using the tracing ecosystem. No preset ever
//! writes to stdout: in bridge mode stdout belongs to the protocol.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, Result, RhinoMcpError};

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr
    Stderr,
    /// Log to file
    File,
    /// Log to both stderr and file
    Both,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output destination
    pub output: LogOutput,
    /// Log level filter (e.g., "info", "debug", "rhinomcp_server=debug,tokio=warn")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
    /// Include file/line in logs
    pub file_line: bool,
    /// Optional custom log file name (defaults to "rhinomcp.log")
    pub file_name: Option<String>,
    /// Optional log directory (defaults to [`paths::log_dir`])
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            span_events: false,
            file_line: false,
            file_name: None,
            dir: None,
        }
    }
}

impl LogConfig {
    /// Create config for the socket command server
    pub fn server() -> Self {
        Self {
            output: LogOutput::Both,
            filter: std::env::var("RHINOMCP_LOG").unwrap_or_else(|_| "info".into()),
            span_events: false,
            file_line: true,
            file_name: Some("server.log".into()),
            dir: None,
        }
    }

    /// Create config for the MCP bridge (stderr plus a separate file)
    pub fn mcp_bridge() -> Self {
        Self {
            output: LogOutput::Both,
            filter: std::env::var("RHINOMCP_MCP_LOG")
                .or_else(|_| std::env::var("RHINOMCP_LOG"))
                .unwrap_or_else(|_| "info".into()),
            span_events: false,
            file_line: true,
            file_name: Some("mcp-bridge.log".into()),
            dir: None,
        }
    }

    /// Create config for development (verbose stderr)
    pub fn development() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "debug".into(),
            span_events: true,
            file_line: true,
            file_name: None,
            dir: None,
        }
    }

    /// Path of the log file this config writes to, if any
    pub fn file_path(&self) -> Option<PathBuf> {
        match self.output {
            LogOutput::Stderr => None,
            LogOutput::File | LogOutput::Both => {
                let dir = self.dir.clone().unwrap_or_else(paths::log_dir);
                let name = self.file_name.as_deref().unwrap_or("rhinomcp.log");
                Some(dir.join(name))
            }
        }
    }
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| RhinoMcpError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let fmt_layer = if config.span_events {
        fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    } else {
        fmt_layer
    };

    let fmt_layer = if config.file_line {
        fmt_layer.with_file(true).with_line_number(true)
    } else {
        fmt_layer.with_file(false).with_line_number(false)
    };

    match config.output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| RhinoMcpError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::File => {
            let file = open_log_file(&config)?;

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .map_err(|e| RhinoMcpError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::Both => {
            let file = open_log_file(&config)?;

            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .with(file_layer)
                .try_init()
                .map_err(|e| RhinoMcpError::internal(format!("Failed to init logging: {}", e)))?;
        }
    }

    tracing::debug!(
        filter = %config.filter,
        file = ?config.file_path(),
        "Logging initialized"
    );
    Ok(())
}

fn open_log_file(config: &LogConfig) -> Result<File> {
    let log_path = config
        .file_path()
        .ok_or_else(|| RhinoMcpError::internal("Log output has no file destination"))?;
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));

    paths::ensure_dir(log_dir).map_err(|e| RhinoMcpError::FileWrite {
        path: log_dir.to_path_buf(),
        source: e,
    })?;

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| RhinoMcpError::FileWrite {
            path: log_path,
            source: e,
        })
}
