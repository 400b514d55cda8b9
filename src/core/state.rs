//! Core State trait and transition endpoints.
//!
//! All state machine states must implement [`State`]. Transition graphs
//! refer to states through [`Endpoint`], which adds the wildcard meaning
//! "whatever the current state already is".

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Debug};

/// Trait for state machine states.
///
/// All methods are pure. States are plain values describing the current
/// position in a state machine; whether a state is final is decided by the
/// machine definition, not by the state itself.
///
/// # Required Traits
///
/// - `Clone`: states are copied into history and snapshots
/// - `PartialEq`: states are compared during transition planning
/// - `Debug`: states appear in errors and logs
/// - `Serialize` + `DeserializeOwned`: states are persisted in snapshots
///
/// # Example
///
/// ```rust
/// use waypoint::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum TaskState {
///     Pending,
///     Running,
///     Complete,
/// }
///
/// impl State for TaskState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Pending => "Pending",
///             Self::Running => "Running",
///             Self::Complete => "Complete",
///         }
///     }
/// }
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// One side of a transition edge or effect condition.
///
/// `Any` is the wildcard: as a transition source it matches every state, as
/// a transition target it resolves to the state being left, and in an
/// enter/exit condition it matches every state.
#[derive(Clone, PartialEq, Debug)]
pub enum Endpoint<S: State> {
    Any,
    Is(S),
}

impl<S: State> Endpoint<S> {
    /// Whether this endpoint accepts `state`.
    pub fn matches(&self, state: &S) -> bool {
        match self {
            Self::Any => true,
            Self::Is(own) => own == state,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn as_state(&self) -> Option<&S> {
        match self {
            Self::Any => None,
            Self::Is(state) => Some(state),
        }
    }
}

impl<S: State> From<S> for Endpoint<S> {
    fn from(state: S) -> Self {
        Self::Is(state)
    }
}

impl<S: State> fmt::Display for Endpoint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Is(state) => f.write_str(state.name()),
        }
    }
}
