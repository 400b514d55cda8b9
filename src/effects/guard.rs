//! Guard predicates for controlling effects.
//!
//! Guards are pure boolean functions over the machine's context and the
//! triggering command. A failing guard disqualifies a transition during
//! planning and suppresses enter/exit hooks.

use crate::core::{Command, ContextValue};
use std::fmt;
use std::sync::Arc;

/// Pure predicate deciding whether an effect is eligible.
///
/// # Example
///
/// ```rust
/// use waypoint::core::Command;
/// use waypoint::effects::Guard;
/// use serde_json::{json, Map};
///
/// let has_budget = Guard::new(|context, command: &Command| {
///     let budget = context.get("budget").and_then(|v| v.as_i64()).unwrap_or(0);
///     let cost = command.get("cost").and_then(|v| v.as_i64()).unwrap_or(0);
///     cost <= budget
/// });
///
/// let mut context = Map::new();
/// context.insert("budget".into(), json!(10));
///
/// assert!(has_budget.check(&context, &Command::new("buy").with("cost", json!(3))));
/// assert!(!has_budget.check(&context, &Command::new("buy").with("cost", json!(30))));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Arc<dyn Fn(&ContextValue, &Command) -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ContextValue, &Command) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, context: &ContextValue, command: &Command) -> bool {
        (self.predicate)(context, command)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(<predicate>)")
    }
}
