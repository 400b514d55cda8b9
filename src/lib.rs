//! Waypoint: a transactional, resumable state machine engine
//!
//! A machine is declared once, as an immutable [`StateMachineDefinition`], and
//! executed by any number of [`MachineRuntime`]s. Each runtime owns its state,
//! context and history, and can be suspended to a JSON [`Snapshot`] and
//! resumed later.
//!
//! # Core Concepts
//!
//! - **Transitions**: automatic or command-triggered edges, with `*` wildcards
//! - **Effects**: guarded actions bound to an edge, or to entering or leaving
//!   a state
//! - **Actions**: step lists of calls, context assignments and actor
//!   invocations, driven one step at a time by the runtime
//! - **Transactions**: a failing `start`/`execute` leaves the runtime exactly
//!   as it was before the call
//!
//! # Example
//!
//! ```rust
//! use waypoint::prelude::*;
//! use serde_json::{json, Map};
//!
//! state_enum! {
//!     enum Light {
//!         Green,
//!         Yellow,
//!         Red,
//!     }
//! }
//!
//! # tokio_test_block(async {
//! let definition = StateMachineBuilder::new()
//!     .initial(Light::Green)
//!     .automatic(Light::Green, Light::Yellow)
//!     .automatic(Light::Yellow, Light::Red)
//!     .command(Light::Red, Light::Green, "walk")
//!     .effect(
//!         Effect::on(EffectCondition::enter(Light::Red))
//!             .action(|_, _| Action::from(assign(json!({ "stopped": true })))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut runtime = definition.run(Map::new(), ActorRegistry::new()).unwrap();
//! runtime.start().await.unwrap();
//!
//! assert_eq!(runtime.state(), &Light::Red);
//! assert_eq!(runtime.status(), RuntimeStatus::Pending);
//! assert_eq!(runtime.context()["stopped"], json!(true));
//! assert!(runtime.can_accept_command("walk"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod machine;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use core::{Command, Context, ContextValue, Endpoint, History, State, Transition};
pub use effects::{assign, invoke, Action, ActionError, Effect, EffectCondition, Guard};
pub use machine::{
    ActorRegistry, MachineConfig, MachineError, MachineRuntime, RuntimeStatus,
    StateMachineDefinition,
};
pub use snapshot::{Snapshot, SnapshotError};

/// Everything needed to declare and run a machine.
pub mod prelude {
    pub use crate::builder::{BuildError, StateMachineBuilder};
    pub use crate::core::{Command, ContextValue, Endpoint, State, Transition};
    pub use crate::effects::{assign, invoke, Action, ActionError, Effect, EffectCondition};
    pub use crate::machine::{
        ActorRegistry, MachineError, MachineRuntime, RuntimeStatus, StateMachineDefinition,
    };
    pub use crate::snapshot::Snapshot;
    pub use crate::state_enum;
}
