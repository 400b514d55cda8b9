//! Commands sent to a running machine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named request with an arbitrary JSON payload.
///
/// Serializes as `{ "type": <name>, ...payload }`. The default command has
/// an empty name and is what guards observe for automatic transitions and
/// enter/exit hooks.
///
/// ```rust
/// use waypoint::core::Command;
/// use serde_json::json;
///
/// let add = Command::new("add").with("value", json!(3));
/// assert_eq!(add.name(), "add");
/// assert_eq!(add.get("value"), Some(&json!(3)));
/// assert_eq!(
///     serde_json::to_value(&add).unwrap(),
///     json!({ "type": "add", "value": 3 })
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    name: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Map::new(),
        }
    }

    /// Add a payload field, replacing any previous value under `key`.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// True for the nameless command used by automatic triggers.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}
