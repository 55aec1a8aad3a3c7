//! Modeling host capability
//!
//! The dispatcher never touches geometry itself. It talks to a
//! [`ModelingHost`], which the document worker owns exclusively, so every
//! implementation is driven from a single thread in arrival order.

mod memory;

pub use memory::MemoryDocumentHost;

use rhinomcp_protocol::Operation;
use serde::Serialize;
use serde_json::Value;

/// A point in model space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A validated operation ready to run against the active document
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    CreateSphere {
        center: Point3,
        radius: f64,
        color: Option<String>,
    },
    CreateBox {
        corner: Point3,
        width: f64,
        depth: f64,
        height: f64,
        color: Option<String>,
    },
    CreateCylinder {
        base: Point3,
        height: f64,
        radius: f64,
        color: Option<String>,
    },
    GetSceneInfo,
    ClearScene {
        current_layer_only: bool,
    },
    CreateLayer {
        name: String,
        color: Option<String>,
    },
    HealthCheck,
}

impl HostCommand {
    pub fn operation(&self) -> Operation {
        match self {
            HostCommand::CreateSphere { .. } => Operation::CreateSphere,
            HostCommand::CreateBox { .. } => Operation::CreateBox,
            HostCommand::CreateCylinder { .. } => Operation::CreateCylinder,
            HostCommand::GetSceneInfo => Operation::GetSceneInfo,
            HostCommand::ClearScene { .. } => Operation::ClearScene,
            HostCommand::CreateLayer { .. } => Operation::CreateLayer,
            HostCommand::HealthCheck => Operation::HealthCheck,
        }
    }
}

/// Failure raised by a host while executing a command
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("no active document")]
    NoDocument,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Operation(String),

    /// The host panicked while running the command
    #[error("host fault: {0}")]
    Fault(String),

    #[error("document worker is not running")]
    WorkerGone,
}

/// The modeling API the dispatcher depends on
pub trait ModelingHost: Send + 'static {
    /// Whether a document is open and can accept commands
    fn has_active_document(&self) -> bool;

    /// Run a command against the active document
    fn execute(&mut self, command: HostCommand) -> Result<Value, HostError>;
}
