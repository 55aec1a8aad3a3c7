//! rhinomcp server - command server and MCP bridge entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{error, info};

use rhinomcp_server::signal::termination_signal;
use rhinomcp_server::{
    AppConfig, BridgeOptions, CommandServer, ConfigLoader, Dispatcher, McpBridge,
    MemoryDocumentHost, RelayClient,
};
use rhinomcp_utils::{LogConfig, Result, RhinoMcpError};

#[derive(Parser, Debug)]
#[command(name = "rhinomcp-server")]
#[command(author, version, about = "Drive a 3D modeling host from an AI assistant over MCP")]
struct Args {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/rhinomcp/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command server port, used by both modes
    #[arg(short, long, env = "RHINOMCP_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the socket command server with the in-process document host (default)
    Serve {
        /// Start without an active document
        #[arg(long)]
        no_document: bool,
    },
    /// Run the MCP stdio bridge that relays tool calls to the command server
    McpBridge,
}

/// Run the socket command server
async fn run_server(config: AppConfig, open_document: bool) -> Result<()> {
    info!("rhinomcp command server starting");

    let host = if open_document && config.server.open_document {
        MemoryDocumentHost::new()
    } else {
        MemoryDocumentHost::without_document()
    };
    let dispatcher = Dispatcher::with_host(host)
        .map_err(|e| RhinoMcpError::internal(format!("Failed to start document worker: {}", e)))?;

    let server = CommandServer::bind(
        &config.server.addr(),
        dispatcher,
        config.limits.max_message_bytes,
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let accept_loop = tokio::spawn(server.run(shutdown_rx));

    termination_signal().await;
    info!("Termination signal received");
    let _ = shutdown_tx.send(());

    if let Err(e) = accept_loop.await {
        error!("Accept loop task failed: {}", e);
    }

    info!("rhinomcp command server stopped");
    Ok(())
}

/// Run the MCP stdio bridge
async fn run_mcp_bridge(config: AppConfig) -> Result<()> {
    let relay = RelayClient::from_config(&config);
    let bridge = McpBridge::new(relay, BridgeOptions::from(&config.bridge));

    bridge
        .run_stdio(termination_signal())
        .await
        .map_err(|e| RhinoMcpError::Internal(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::load_and_validate(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.override_port(port);
        ConfigLoader::validate(&config)?;
    }

    match args.command.unwrap_or(Command::Serve { no_document: false }) {
        Command::Serve { no_document } => {
            rhinomcp_utils::init_logging_with_config(LogConfig::server())?;
            run_server(config, !no_document).await
        }
        Command::McpBridge => {
            // stdout carries protocol lines only; logs go to stderr and the log file
            rhinomcp_utils::init_logging_with_config(LogConfig::mcp_bridge())?;
            run_mcp_bridge(config).await
        }
    }
}
