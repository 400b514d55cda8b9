//! Runtime error types.

use super::status::RuntimeStatus;
use crate::core::InapplicableState;
use crate::effects::ActionError;
use crate::snapshot::SnapshotError;
use thiserror::Error;

/// Errors raised by a runtime.
///
/// Any of these raised inside `start`/`execute` is returned only after the
/// runtime has been rolled back to its state before the call.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Runtime can only be started when stopped (status: {status})")]
    NotStopped { status: RuntimeStatus },

    #[error("Runtime only accepts commands when pending (status: {status})")]
    NotPending { status: RuntimeStatus },

    #[error("No transition available for command '{command}' from state '{state}'")]
    NoTransition { command: String, state: String },

    #[error("Snapshot cannot be taken while the runtime is running")]
    IsRunning,

    #[error(transparent)]
    InapplicableState(#[from] InapplicableState),

    #[error("Actor '{0}' is not registered")]
    UnknownActor(String),

    #[error("Actors declared by the machine are not registered: {0:?}")]
    MissingActors(Vec<String>),

    #[error("Assigned value must be a JSON object, got {0}")]
    InvalidAssign(String),

    #[error("More than {limit} transitions in a single call")]
    ChainLimitExceeded { limit: usize },

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
