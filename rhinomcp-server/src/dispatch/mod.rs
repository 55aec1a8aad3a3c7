//! Command dispatcher
//!
//! Maps a bare operation name to a typed host command, checks the
//! active-document precondition and runs the command on the document worker.
//! Every outcome, including host faults, comes back as a [`CommandResult`].

mod command;
mod worker;

pub use worker::DocumentWorker;

use rhinomcp_protocol::{find_operation, CommandEnvelope, CommandResult, ParamBag};
use tracing::{debug, warn};

use crate::host::{HostCommand, HostError, ModelingHost};

/// Dispatches command envelopes to the modeling host
#[derive(Debug, Clone)]
pub struct Dispatcher {
    worker: DocumentWorker,
}

impl Dispatcher {
    pub fn new(worker: DocumentWorker) -> Self {
        Self { worker }
    }

    /// Start a document worker that owns `host` and dispatch onto it
    pub fn with_host<H: ModelingHost>(host: H) -> std::io::Result<Self> {
        Ok(Self::new(DocumentWorker::spawn(host)?))
    }

    /// Dispatch one command
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> CommandResult {
        let CommandEnvelope {
            command_type,
            params,
        } = envelope;

        let Some(operation) = find_operation(&command_type) else {
            warn!(command = %command_type, "Unknown command type");
            return CommandResult::failure(format!("unknown command type: {}", command_type));
        };

        let bag = match ParamBag::validate(operation.params(), &params) {
            Ok(bag) => bag,
            Err(e) => {
                warn!(command = %command_type, error = %e, "Parameter validation failed");
                return CommandResult::failure(format!("invalid parameters: {}", e));
            }
        };
        if !bag.ignored().is_empty() {
            debug!(command = %command_type, ignored = ?bag.ignored(), "Ignoring undeclared parameters");
        }

        let command = match HostCommand::from_params(operation, &bag) {
            Ok(command) => command,
            Err(e) => return CommandResult::failure(format!("invalid parameters: {}", e)),
        };

        let requires_document = operation.requires_document();
        let outcome = self
            .worker
            .run(move |host| {
                if requires_document && !host.has_active_document() {
                    return Err(HostError::NoDocument);
                }
                host.execute(command)
            })
            .await
            .and_then(|result| result);

        match outcome {
            Ok(value) => {
                debug!(command = %command_type, "Command succeeded");
                CommandResult::ok(value)
            }
            Err(e) => {
                warn!(command = %command_type, error = %e, "Command failed");
                CommandResult::failure(e.to_string())
            }
        }
    }
}
