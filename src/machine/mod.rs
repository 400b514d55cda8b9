//! Definitions and the runtimes that execute them.
//!
//! A [`StateMachineDefinition`] is an immutable value describing the graph,
//! its effects and the actors it needs. [`StateMachineDefinition::run`] and
//! [`StateMachineDefinition::restore_runtime`] produce a [`MachineRuntime`],
//! which owns the mutable state of one execution.

mod actors;
mod definition;
mod error;
mod runtime;
mod status;

pub use actors::{Actor, ActorFuture, ActorRegistry};
pub use definition::{MachineConfig, StateMachineDefinition, DEFAULT_MAX_CHAIN};
pub use error::MachineError;
pub use runtime::MachineRuntime;
pub use status::RuntimeStatus;
