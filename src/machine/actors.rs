//! Named external functions actions may invoke.

use crate::effects::ActionError;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type ActorFuture = BoxFuture<'static, Result<Value, ActionError>>;

/// An actor receives the parameters of an `invoke` step and produces the
/// value the action resumes with.
pub type Actor = Arc<dyn Fn(Vec<Value>) -> ActorFuture + Send + Sync>;

/// Registry of actors supplied when a runtime is created or restored.
///
/// ```rust
/// use waypoint::machine::ActorRegistry;
/// use serde_json::{json, Value};
///
/// let actors = ActorRegistry::new()
///     .register("sum", |params: Vec<Value>| {
///         Ok(json!(params.iter().filter_map(Value::as_i64).sum::<i64>()))
///     })
///     .register_async("echo", |params: Vec<Value>| async move {
///         Ok(params.into_iter().next().unwrap_or(Value::Null))
///     });
///
/// assert!(actors.contains("sum"));
/// assert_eq!(actors.names(), vec!["echo", "sum"]);
/// ```
#[derive(Clone, Default)]
pub struct ActorRegistry {
    actors: HashMap<String, Actor>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous actor, replacing any actor with the same name.
    pub fn register<F>(self, name: impl Into<String>, actor: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        let actor: Actor = Arc::new(move |params| future::ready(actor(params)).boxed());
        self.insert(name.into(), actor)
    }

    /// Register an asynchronous actor, replacing any actor with the same name.
    pub fn register_async<F, Fut>(self, name: impl Into<String>, actor: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
    {
        let actor: Actor = Arc::new(move |params| actor(params).boxed());
        self.insert(name.into(), actor)
    }

    fn insert(mut self, name: String, actor: Actor) -> Self {
        self.actors.insert(name, actor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Actor> {
        self.actors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names from `required` that are not registered, in the given order.
    pub fn missing<'a>(&self, required: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        required
            .into_iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRegistry")
            .field("actors", &self.names())
            .finish()
    }
}
