//! Execution history tracking.
//!
//! Provides an append-only log of the states a machine entered and the
//! commands it received, each stamped with the time it was recorded.

use super::command::Command;
use super::state::State;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single history record.
///
/// Serializes as `{ "type": "state", "state": .., "timestamp": <epoch-ms> }`
/// or `{ "type": "command", "command": { "type": .., .. }, "timestamp": .. }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", bound = "")]
pub enum HistoryEntry<S: State> {
    State {
        state: S,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    Command {
        command: Command,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
}

impl<S: State> HistoryEntry<S> {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::State { timestamp, .. } | Self::Command { timestamp, .. } => *timestamp,
        }
    }
}

/// Current time at the millisecond precision entries are persisted with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Persisted form of a [`History`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct HistorySnapshot<S: State> {
    pub entries: Vec<HistoryEntry<S>>,
}

/// Ordered log of state entries and commands.
///
/// Appending is the only mutation allowed during normal operation; a whole
/// history is replaced only when a runtime is restored or rolled back.
///
/// # Example
///
/// ```rust
/// use waypoint::core::{Command, History, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Phase { One, Two }
///
/// impl State for Phase {
///     fn name(&self) -> &str {
///         match self {
///             Self::One => "One",
///             Self::Two => "Two",
///         }
///     }
/// }
///
/// let mut history = History::new();
/// history
///     .save_state(Phase::One)
///     .save_command(Command::new("next"))
///     .save_state(Phase::Two);
///
/// assert_eq!(history.entries().len(), 3);
/// assert_eq!(history.path(), vec![&Phase::One, &Phase::Two]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct History<S: State> {
    entries: Vec<HistoryEntry<S>>,
}

impl<S: State> Default for History<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> History<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record that `state` was entered.
    pub fn save_state(&mut self, state: S) -> &mut Self {
        self.entries.push(HistoryEntry::State {
            state,
            timestamp: now(),
        });
        self
    }

    /// Record that `command` was received.
    pub fn save_command(&mut self, command: Command) -> &mut Self {
        self.entries.push(HistoryEntry::Command {
            command,
            timestamp: now(),
        });
        self
    }

    pub fn get_snapshot(&self) -> HistorySnapshot<S> {
        HistorySnapshot {
            entries: self.entries.clone(),
        }
    }

    /// Rebuild a history holding exactly the persisted entries.
    pub fn restore(snapshot: HistorySnapshot<S>) -> Self {
        Self {
            entries: snapshot.entries,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry<S>] {
        &self.entries
    }

    /// States entered, in order.
    pub fn path(&self) -> Vec<&S> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                HistoryEntry::State { state, .. } => Some(state),
                HistoryEntry::Command { .. } => None,
            })
            .collect()
    }

    /// Commands received, in order.
    pub fn commands(&self) -> Vec<&Command> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                HistoryEntry::Command { command, .. } => Some(command),
                HistoryEntry::State { .. } => None,
            })
            .collect()
    }

    /// Time elapsed between the first and last entry.
    ///
    /// Returns `None` for an empty history.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) {
            let duration = last.timestamp().signed_duration_since(first.timestamp());
            duration.to_std().ok()
        } else {
            None
        }
    }
}
