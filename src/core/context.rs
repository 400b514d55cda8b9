//! Machine user data.

use serde_json::{Map, Value};

/// The JSON object a machine carries as its user data.
pub type ContextValue = Map<String, Value>;

/// Immutable wrapper around a machine's user data.
///
/// `merge` never mutates; it returns a new context. Read views are deep
/// copies, so anything handed to guards, actions or callers is detached
/// from the value the runtime keeps.
///
/// ```rust
/// use waypoint::core::Context;
/// use serde_json::json;
///
/// let context = Context::create(json!({ "a": 1, "b": { "x": true } }).as_object().unwrap().clone());
/// let merged = context.merge(json!({ "b": { "y": true } }).as_object().unwrap().clone());
///
/// assert_eq!(merged.get_readonly()["a"], json!(1));
/// assert_eq!(merged.get_readonly()["b"], json!({ "y": true }));
/// assert_eq!(context.get_readonly()["b"], json!({ "x": true }));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    value: ContextValue,
}

impl Context {
    pub fn create(value: ContextValue) -> Self {
        Self { value }
    }

    /// Shallow top-level union: keys in `partial` replace keys in the
    /// current value wholesale, nested objects and arrays included.
    pub fn merge(&self, partial: ContextValue) -> Self {
        let mut value = self.value.clone();
        value.extend(partial);
        Self { value }
    }

    /// Detached copy of the current value.
    pub fn get_readonly(&self) -> ContextValue {
        self.value.clone()
    }

    /// Detached copy of the current value, for persistence.
    pub fn get_snapshot(&self) -> ContextValue {
        self.value.clone()
    }

    /// Borrow the current value. Shared borrows cannot mutate it, so guards
    /// are evaluated against this without copying.
    pub fn value(&self) -> &ContextValue {
        &self.value
    }
}
