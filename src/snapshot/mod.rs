//! Snapshots for suspending and resuming runtimes.
//!
//! A [`Snapshot`] is the only externally persistable form of a runtime.
//! Persisting it is the caller's job; this module only produces and
//! validates the serializable value.
//!
//! The JSON shape is:
//!
//! ```json
//! {
//!   "context": { "...": "..." },
//!   "state": "Red",
//!   "status": "pending",
//!   "history": { "entries": [
//!     { "type": "state", "state": "Red", "timestamp": 1700000000000 },
//!     { "type": "command", "command": { "type": "walk" }, "timestamp": 1700000000001 }
//!   ] }
//! }
//! ```

use crate::core::{ContextValue, State};
use crate::machine::RuntimeStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;

pub use crate::core::{HistoryEntry, HistorySnapshot};
pub use error::SnapshotError;

/// Serializable `{context, state, status, history}` of a runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Snapshot<S: State> {
    pub context: ContextValue,
    pub state: S,
    pub status: RuntimeStatus,
    pub history: HistorySnapshot<S>,
}

impl<S: State> Snapshot<S> {
    pub fn to_value(&self) -> Result<Value, SnapshotError> {
        serde_json::to_value(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    /// Decode a snapshot, reporting an unknown status or state precisely.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let status = value.get("status").cloned().unwrap_or(Value::Null);
        let recognized = status
            .as_str()
            .is_some_and(|raw| raw.parse::<RuntimeStatus>().is_ok());
        if !recognized {
            return Err(SnapshotError::StatusInvalid {
                status: status.to_string(),
            });
        }

        let state = value.get("state").cloned().unwrap_or(Value::Null);
        if serde_json::from_value::<S>(state.clone()).is_err() {
            return Err(SnapshotError::StateInvalid {
                state: state.to_string(),
            });
        }

        serde_json::from_value(value).map_err(|e| SnapshotError::Deserialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SnapshotError::Deserialization(e.to_string()))?;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Command, History};
    use serde_json::json;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Light {
        Red,
        Green,
    }

    impl State for Light {
        fn name(&self) -> &str {
            match self {
                Self::Red => "Red",
                Self::Green => "Green",
            }
        }
    }

    fn sample() -> Snapshot<Light> {
        let mut history = History::new();
        history
            .save_state(Light::Red)
            .save_command(Command::new("walk"))
            .save_state(Light::Green);

        Snapshot {
            context: json!({ "cars": 3 }).as_object().cloned().unwrap(),
            state: Light::Green,
            status: RuntimeStatus::Pending,
            history: history.get_snapshot(),
        }
    }

    #[test]
    fn encodes_documented_shape() {
        let value = sample().to_value().unwrap();

        assert_eq!(value["context"], json!({ "cars": 3 }));
        assert_eq!(value["state"], json!("Green"));
        assert_eq!(value["status"], json!("pending"));
        assert_eq!(value["history"]["entries"][1]["command"], json!({ "type": "walk" }));
    }

    #[test]
    fn json_round_trip_preserves_snapshot() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap();
        let decoded = Snapshot::<Light>::from_json(&json).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut value = sample().to_value().unwrap();
        value["status"] = json!("paused");

        let err = Snapshot::<Light>::from_value(value).unwrap_err();
        assert!(matches!(err, SnapshotError::StatusInvalid { status } if status == "\"paused\""));
    }

    #[test]
    fn missing_status_is_rejected() {
        let mut value = sample().to_value().unwrap();
        value.as_object_mut().unwrap().remove("status");

        let err = Snapshot::<Light>::from_value(value).unwrap_err();
        assert!(matches!(err, SnapshotError::StatusInvalid { .. }));
    }

    #[test]
    fn unknown_state_is_rejected() {
        let mut value = sample().to_value().unwrap();
        value["state"] = json!("Blue");

        let err = Snapshot::<Light>::from_value(value).unwrap_err();
        assert!(matches!(err, SnapshotError::StateInvalid { .. }));
    }

    #[test]
    fn malformed_history_is_a_decode_error() {
        let mut value = sample().to_value().unwrap();
        value["history"] = json!({ "entries": [{ "type": "mystery" }] });

        let err = Snapshot::<Light>::from_value(value).unwrap_err();
        assert!(matches!(err, SnapshotError::Deserialization(_)));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = Snapshot::<Light>::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Deserialization(_)));
    }
}
