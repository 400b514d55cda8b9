//! Composable, resumable action steps.
//!
//! An [`Action`] is an immutable list of steps. Iterating it yields one
//! [`ActionResult`] per step and suspends until the driver resumes it with
//! the resolved [`Payload`]. The driver (the machine runtime) decides what a
//! step means: it awaits calls, merges assigns into the live context and
//! dispatches invokes to actors.
//!
//! ```rust
//! use waypoint::effects::{assign, Action, ActionResult, Payload, StepOutcome};
//! use serde_json::json;
//!
//! let action = Action::call(|input| Ok(json!(input.as_i64().unwrap_or(0) + 1)))
//!     .then(assign(json!({ "touched": true })));
//!
//! let mut steps = action.iterate(json!(41));
//! let StepOutcome::Yield(ActionResult::Call(call)) = steps.start().unwrap() else { panic!() };
//! let resolved = futures::executor::block_on(call).unwrap();
//! let StepOutcome::Yield(ActionResult::Assign(_)) = steps.resume(resolved).unwrap() else { panic!() };
//! let outcome = steps.resume(Payload::Value(json!(null))).unwrap();
//! assert!(matches!(outcome, StepOutcome::Done(v) if v == json!(42)));
//! ```

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure raised by a call step, an actor, or misuse of an [`ActionIter`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] BoxError),

    #[error("Action protocol violated: {0}")]
    Protocol(&'static str),
}

impl ActionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(err))
    }
}

/// What a suspended step is resumed with.
///
/// Only call steps may resolve to an `Action`; the iterator then runs the
/// nested action in place before continuing with the remaining steps.
pub enum Payload {
    Value(Value),
    Action(Action),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Action> for Payload {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
        }
    }
}

/// Partial context update, merged by the runtime before the next step runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Assign {
    pub patch: Value,
}

/// Request to call a registered actor with the given parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Invoke {
    pub actor: String,
    pub params: Vec<Value>,
}

/// Build an [`Assign`] descriptor. `patch` must be a JSON object.
pub fn assign(patch: Value) -> Assign {
    Assign { patch }
}

/// Build an [`Invoke`] descriptor.
pub fn invoke(actor: impl Into<String>, params: Vec<Value>) -> Invoke {
    Invoke {
        actor: actor.into(),
        params,
    }
}

/// One-step action running a plain function. Shorthand for [`Action::call`].
pub fn from_fn<F, R>(f: F) -> Action
where
    F: Fn(Value) -> Result<R, ActionError> + Send + Sync + 'static,
    R: Into<Payload> + 'static,
{
    Action::call(f)
}

pub type CallFuture = BoxFuture<'static, Result<Payload, ActionError>>;

type CallFn = Arc<dyn Fn(Value) -> CallFuture + Send + Sync>;
type AssignFn = Arc<dyn Fn(&Value) -> Assign + Send + Sync>;
type InvokeFn = Arc<dyn Fn(&Value) -> Invoke + Send + Sync>;
type ChainFn = Arc<dyn Fn(Value) -> Action + Send + Sync>;

#[derive(Clone)]
enum Step {
    Call(CallFn),
    Assign(AssignFn),
    Invoke(InvokeFn),
    /// Steps unknown until the previous output exists.
    Chain(ChainFn),
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Self::Call(_) => "call",
            Self::Assign(_) => "assign",
            Self::Invoke(_) => "invoke",
            Self::Chain(_) => "chain",
        }
    }
}

/// What a single step asks the driver to do.
pub enum ActionResult {
    /// Await the future; resume with its output.
    Call(CallFuture),
    /// Merge the patch into the live context; the running input is kept.
    Assign(Assign),
    /// Call the named actor; resume with its output.
    Invoke(Invoke),
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(_) => f.write_str("Call(<future>)"),
            Self::Assign(assign) => f.debug_tuple("Assign").field(assign).finish(),
            Self::Invoke(invoke) => f.debug_tuple("Invoke").field(invoke).finish(),
        }
    }
}

#[derive(Debug)]
pub enum StepOutcome {
    /// The iterator is suspended until [`ActionIter::resume`] is called.
    Yield(ActionResult),
    /// All steps ran; carries the last resolved input.
    Done(Value),
}

/// Immutable, composable sequence of steps.
#[derive(Clone, Default)]
pub struct Action {
    steps: Vec<Step>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(Step::label))
            .finish()
    }
}

impl Action {
    pub fn empty() -> Self {
        Self::default()
    }

    fn single(step: Step) -> Self {
        Self { steps: vec![step] }
    }

    /// One call step running a synchronous function of the running input.
    ///
    /// Returning an `Action` (via `Payload::Action`) flattens it in place.
    pub fn call<F, R>(f: F) -> Self
    where
        F: Fn(Value) -> Result<R, ActionError> + Send + Sync + 'static,
        R: Into<Payload> + 'static,
    {
        let call: CallFn =
            Arc::new(move |input| future::ready(f(input).map(Into::<Payload>::into)).boxed());
        Self::single(Step::Call(call))
    }

    /// One call step running an asynchronous function of the running input.
    pub fn call_async<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ActionError>> + Send + 'static,
        R: Into<Payload> + 'static,
    {
        let call: CallFn = Arc::new(move |input| {
            f(input)
                .map(|result| result.map(Into::<Payload>::into))
                .boxed()
        });
        Self::single(Step::Call(call))
    }

    /// One assign step whose patch is computed from the running input.
    pub fn assign_with<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::single(Step::Assign(Arc::new(move |input| assign(f(input)))))
    }

    /// One invoke step whose actor and parameters are computed from the
    /// running input.
    pub fn invoke_with<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Invoke + Send + Sync + 'static,
    {
        Self::single(Step::Invoke(Arc::new(f)))
    }

    /// Append the steps of another action.
    pub fn then(self, next: impl Into<Action>) -> Self {
        let mut steps = self.steps;
        steps.extend(next.into().steps);
        Self { steps }
    }

    /// Append a call step running a synchronous function.
    pub fn then_call<F, R>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<R, ActionError> + Send + Sync + 'static,
        R: Into<Payload> + 'static,
    {
        self.then(Self::call(f))
    }

    /// Append a call step running an asynchronous function.
    pub fn then_call_async<F, Fut, R>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ActionError>> + Send + 'static,
        R: Into<Payload> + 'static,
    {
        self.then(Self::call_async(f))
    }

    /// Append an action built from the previous output.
    ///
    /// `f` is only called when iteration reaches this point.
    pub fn and_then<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Action + Send + Sync + 'static,
    {
        let mut steps = self.steps;
        steps.push(Step::Chain(Arc::new(f)));
        Self { steps }
    }

    /// Number of top-level steps. Chained and nested actions count as one.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fresh iterator over this action, starting from `input`.
    pub fn iterate(&self, input: Value) -> ActionIter {
        ActionIter {
            frames: vec![Frame::new(self.clone())],
            input,
            state: IterState::NotStarted,
        }
    }
}

impl From<Assign> for Action {
    fn from(descriptor: Assign) -> Self {
        Self::single(Step::Assign(Arc::new(move |_| descriptor.clone())))
    }
}

impl From<Invoke> for Action {
    fn from(descriptor: Invoke) -> Self {
        Self::single(Step::Invoke(Arc::new(move |_| descriptor.clone())))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum StepKind {
    Call,
    Assign,
    Invoke,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum IterState {
    NotStarted,
    AwaitingStep(StepKind),
    Done,
}

struct Frame {
    steps: Vec<Step>,
    next: usize,
}

impl Frame {
    fn new(action: Action) -> Self {
        Self {
            steps: action.steps,
            next: 0,
        }
    }
}

/// Suspended iteration over an [`Action`].
///
/// Call [`start`](Self::start) once, then [`resume`](Self::resume) with the
/// resolved payload after every yielded step until `Done` is returned.
pub struct ActionIter {
    frames: Vec<Frame>,
    input: Value,
    state: IterState,
}

impl ActionIter {
    pub fn start(&mut self) -> Result<StepOutcome, ActionError> {
        if self.state != IterState::NotStarted {
            return Err(ActionError::Protocol("iterator already started"));
        }
        self.advance()
    }

    pub fn resume(&mut self, payload: Payload) -> Result<StepOutcome, ActionError> {
        let IterState::AwaitingStep(kind) = self.state else {
            return Err(ActionError::Protocol("iterator is not awaiting a step"));
        };

        match (kind, payload) {
            (StepKind::Call, Payload::Action(nested)) => self.frames.push(Frame::new(nested)),
            (_, Payload::Action(_)) => {
                return Err(ActionError::Protocol(
                    "only call steps may resolve to an action",
                ))
            }
            (StepKind::Assign, Payload::Value(_)) => {}
            (_, Payload::Value(value)) => self.input = value,
        }

        self.advance()
    }

    pub fn is_done(&self) -> bool {
        self.state == IterState::Done
    }

    fn advance(&mut self) -> Result<StepOutcome, ActionError> {
        loop {
            let Some(frame) = self.frames.last_mut() else {
                self.state = IterState::Done;
                return Ok(StepOutcome::Done(self.input.clone()));
            };
            let Some(step) = frame.steps.get(frame.next).cloned() else {
                self.frames.pop();
                continue;
            };
            frame.next += 1;

            match step {
                Step::Call(call) => {
                    self.state = IterState::AwaitingStep(StepKind::Call);
                    return Ok(StepOutcome::Yield(ActionResult::Call(call(
                        self.input.clone(),
                    ))));
                }
                Step::Assign(patch) => {
                    self.state = IterState::AwaitingStep(StepKind::Assign);
                    return Ok(StepOutcome::Yield(ActionResult::Assign(patch(&self.input))));
                }
                Step::Invoke(request) => {
                    self.state = IterState::AwaitingStep(StepKind::Invoke);
                    return Ok(StepOutcome::Yield(ActionResult::Invoke(request(
                        &self.input,
                    ))));
                }
                Step::Chain(build) => {
                    let nested = build(self.input.clone());
                    self.frames.push(Frame::new(nested));
                }
            }
        }
    }
}
