//! Edges of the state graph.

use super::state::{Endpoint, State};
use thiserror::Error;

/// Raised when a transition is asked for its target from a state it does
/// not leave.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Transition from '{from}' cannot be taken from state '{state}'")]
pub struct InapplicableState {
    pub from: String,
    pub state: String,
}

/// A directed edge between two endpoints, optionally requiring a command.
///
/// A named transition is manual: it fires only in response to a command
/// with the same name. An unnamed transition is automatic and fires
/// whenever it is reachable.
///
/// # Example
///
/// ```rust
/// use waypoint::core::{Endpoint, State, Transition};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Light { Red, Green }
///
/// impl State for Light {
///     fn name(&self) -> &str {
///         match self {
///             Self::Red => "Red",
///             Self::Green => "Green",
///         }
///     }
/// }
///
/// let walk = Transition::manual(Light::Red, Light::Green, "walk");
/// assert!(walk.is("walk"));
/// assert!(walk.can_transition_from(&Light::Red));
///
/// let reset = Transition::automatic(Endpoint::Any, Light::Red);
/// assert!(!reset.is_manual());
/// assert_eq!(reset.get_target(&Light::Green).unwrap(), Light::Red);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<S: State> {
    pub from: Endpoint<S>,
    pub to: Endpoint<S>,
    pub name: Option<String>,
}

impl<S: State> Transition<S> {
    /// Create an unnamed transition that fires without a command.
    pub fn automatic(from: impl Into<Endpoint<S>>, to: impl Into<Endpoint<S>>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            name: None,
        }
    }

    /// Create a transition that fires only for the command `name`.
    pub fn manual(
        from: impl Into<Endpoint<S>>,
        to: impl Into<Endpoint<S>>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            name: Some(name.into()),
        }
    }

    /// Whether this edge leaves `state`.
    pub fn can_transition_from(&self, state: &S) -> bool {
        self.from.matches(state)
    }

    /// Resolve the state reached when this edge is taken from `state`.
    ///
    /// A wildcard target resolves to `state` itself.
    pub fn get_target(&self, state: &S) -> Result<S, InapplicableState> {
        if !self.can_transition_from(state) {
            return Err(InapplicableState {
                from: self.from.to_string(),
                state: state.name().to_string(),
            });
        }

        Ok(match &self.to {
            Endpoint::Any => state.clone(),
            Endpoint::Is(target) => target.clone(),
        })
    }

    /// Exact match against the command name. Automatic transitions never match.
    pub fn is(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn is_manual(&self) -> bool {
        self.name.is_some()
    }

    /// True when this edge connects the same endpoints as `from -> to`.
    pub fn connects(&self, from: &Endpoint<S>, to: &Endpoint<S>) -> bool {
        &self.from == from && &self.to == to
    }
}
