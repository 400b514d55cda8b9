//! Behaviors attached to transitions and to entering or leaving states.

use super::action::{Action, ActionIter};
use super::guard::Guard;
use crate::core::{Command, ContextValue, Endpoint, State, Transition};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Builds the action an effect runs from a context view and the triggering
/// command.
pub type ActionBuilder = Arc<dyn Fn(&ContextValue, &Command) -> Action + Send + Sync>;

/// When an effect applies.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectCondition<S: State> {
    /// Taking the edge `from -> to`, compared as declared (wildcards included).
    Transition { from: Endpoint<S>, to: Endpoint<S> },
    /// Entering the state; `Any` matches every state.
    Enter(Endpoint<S>),
    /// Leaving the state; `Any` matches every state.
    Exit(Endpoint<S>),
}

impl<S: State> EffectCondition<S> {
    pub fn transition(from: impl Into<Endpoint<S>>, to: impl Into<Endpoint<S>>) -> Self {
        Self::Transition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn enter(state: impl Into<Endpoint<S>>) -> Self {
        Self::Enter(state.into())
    }

    pub fn exit(state: impl Into<Endpoint<S>>) -> Self {
        Self::Exit(state.into())
    }
}

/// A guarded, optional action bound to an [`EffectCondition`].
///
/// # Example
///
/// ```rust
/// use waypoint::core::{Command, State, Transition};
/// use waypoint::effects::{assign, Action, Effect, EffectCondition};
/// use serde::{Deserialize, Serialize};
/// use serde_json::{json, Map};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door { Open, Closed }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// let effect = Effect::on(EffectCondition::transition(Door::Closed, Door::Open))
///     .when(|context, _| context.get("locked") != Some(&json!(true)))
///     .action(|_, _| Action::from(assign(json!({ "opened": true }))));
///
/// assert!(effect.matches_transition(&Transition::manual(Door::Closed, Door::Open, "open")));
/// assert!(effect.test_guard(&Map::new(), &Command::new("open")));
/// ```
#[derive(Clone)]
pub struct Effect<S: State> {
    condition: EffectCondition<S>,
    guard: Option<Guard>,
    action: Option<ActionBuilder>,
}

impl<S: State> fmt::Debug for Effect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("condition", &self.condition)
            .field("guard", &self.guard.is_some())
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl<S: State> Effect<S> {
    /// An effect with no guard and no action.
    pub fn on(condition: EffectCondition<S>) -> Self {
        Self {
            condition,
            guard: None,
            action: None,
        }
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&ContextValue, &Command) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Set the action built for each execution.
    pub fn action<F>(mut self, build: F) -> Self
    where
        F: Fn(&ContextValue, &Command) -> Action + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(build));
        self
    }

    pub fn condition(&self) -> &EffectCondition<S> {
        &self.condition
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn is_transition_scoped(&self) -> bool {
        matches!(self.condition, EffectCondition::Transition { .. })
    }

    pub fn matches_transition(&self, transition: &Transition<S>) -> bool {
        match &self.condition {
            EffectCondition::Transition { from, to } => transition.connects(from, to),
            _ => false,
        }
    }

    pub fn matches_enter(&self, state: &S) -> bool {
        match &self.condition {
            EffectCondition::Enter(endpoint) => endpoint.matches(state),
            _ => false,
        }
    }

    pub fn matches_exit(&self, state: &S) -> bool {
        match &self.condition {
            EffectCondition::Exit(endpoint) => endpoint.matches(state),
            _ => false,
        }
    }

    /// True when there is no guard or the guard passes.
    pub fn test_guard(&self, context: &ContextValue, command: &Command) -> bool {
        self.guard
            .as_ref()
            .is_none_or(|guard| guard.check(context, command))
    }

    /// Steps of this effect's action; finishes immediately when there is none.
    pub fn execute(&self, context: &ContextValue, command: &Command) -> ActionIter {
        let action = match &self.action {
            Some(build) => build(context, command),
            None => Action::empty(),
        };
        action.iterate(Value::Null)
    }
}
