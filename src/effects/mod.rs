//! Effects and the action step protocol.
//!
//! This module provides the behavior layer around the pure core:
//!
//! - **Guards**: predicates over context and command
//! - **Effects**: guarded actions bound to a transition edge or to entering
//!   or leaving a state
//! - **Actions**: composable step lists (call, assign, invoke) iterated one
//!   step at a time, so the engine can resolve each step without knowing how
//!   it is implemented
//!
//! Closures are stored behind `Arc`, so effects and actions are cheap to
//! clone; futures are boxed once per call step.

pub mod action;
mod effect;
mod guard;

pub use action::{
    assign, from_fn, invoke, Action, ActionError, ActionIter, ActionResult, Assign, BoxError,
    CallFuture, Invoke, Payload, StepOutcome,
};
pub use effect::{ActionBuilder, Effect, EffectCondition};
pub use guard::Guard;
