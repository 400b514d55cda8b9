//! Builder API for assembling state machine definitions.
//!
//! The builder collects transitions, effects and configuration with a fluent
//! API and validates the result once, when [`StateMachineBuilder::build`] is
//! called.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
