//! Core state machine types.
//!
//! This module contains the pure value types the engine is built from:
//! - States via the `State` trait, and wildcard-aware `Endpoint`s
//! - Graph edges via `Transition`
//! - Commands and the machine's user data (`Context`)
//! - Append-only `History`
//!
//! Nothing in this module performs side effects.

mod command;
mod context;
mod history;
mod state;
mod transition;

pub use command::Command;
pub use context::{Context, ContextValue};
pub use history::{History, HistoryEntry, HistorySnapshot};
pub use state::{Endpoint, State};
pub use transition::{InapplicableState, Transition};
