use crate::snapshot::SnapshotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a runtime.
///
/// `Stopped -> Running -> {Pending, Done}`, `Pending -> Running -> {Pending, Done}`.
/// `Done` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeStatus {
    Stopped,
    Pending,
    Running,
    Done,
}

impl RuntimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeStatus {
    type Err = SnapshotError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "stopped" => Ok(Self::Stopped),
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            other => Err(SnapshotError::StatusInvalid {
                status: other.to_string(),
            }),
        }
    }
}
