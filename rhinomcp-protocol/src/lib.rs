//! rhinomcp-protocol: Shared wire definitions for the bridge and the command server
//!
//! This crate defines the command envelope exchanged over the TCP hop, the
//! uniform result shape every operation produces, the static tool catalog
//! advertised to the assistant, and the length-prefixed JSON codec.

pub mod catalog;
pub mod codec;
pub mod messages;
pub mod params;

// Re-export main types at crate root
pub use catalog::{
    find_operation, resolve_tool_name, strip_namespace, tool_catalog, Namespace, Operation,
    ParamSpec, ParamType, ToolDescriptor,
};
pub use codec::{ClientCodec, CodecError, ServerCodec, MAX_MESSAGE_SIZE};
pub use messages::{CommandEnvelope, CommandResult};
pub use params::{ParamBag, ParamError};

/// Default TCP port of the socket command server
pub const DEFAULT_PORT: u16 = 9876;

/// Default loopback host for both sides of the TCP hop
pub const DEFAULT_HOST: &str = "127.0.0.1";
