//! The runtime that drives a definition.

use super::actors::ActorRegistry;
use super::definition::StateMachineDefinition;
use super::error::MachineError;
use super::status::RuntimeStatus;
use crate::core::{Command, Context, ContextValue, History, State, Transition};
use crate::effects::{ActionResult, Effect, Payload, StepOutcome};
use crate::snapshot::{Snapshot, SnapshotError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owns the state, status, context and history of one running machine.
///
/// Mutating calls (`start`, `execute`) are transactional: if one fails, or
/// its future is dropped before completing, the runtime is restored to what
/// it was before the call.
pub struct MachineRuntime<S: State> {
    id: Uuid,
    definition: Arc<StateMachineDefinition<S>>,
    actors: ActorRegistry,
    context: Context,
    state: S,
    status: RuntimeStatus,
    history: History<S>,
}

/// Chosen transition and the effect declared for it.
type Plan<'d, S> = (&'d Transition<S>, Option<&'d Effect<S>>);

struct Checkpoint<S: State> {
    context: Context,
    state: S,
    status: RuntimeStatus,
    history: History<S>,
}

/// Restores the runtime on drop unless committed.
struct Transaction<'a, S: State> {
    runtime: &'a mut MachineRuntime<S>,
    checkpoint: Option<Checkpoint<S>>,
}

impl<'a, S: State> Transaction<'a, S> {
    fn begin(runtime: &'a mut MachineRuntime<S>) -> Self {
        let checkpoint = Checkpoint {
            context: runtime.context.clone(),
            state: runtime.state.clone(),
            status: runtime.status,
            history: runtime.history.clone(),
        };
        Self {
            runtime,
            checkpoint: Some(checkpoint),
        }
    }

    fn commit(mut self) {
        self.checkpoint = None;
    }
}

impl<S: State> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            warn!(
                runtime_id = %self.runtime.id,
                state = self.runtime.state.name(),
                restored_state = checkpoint.state.name(),
                "Rolling back runtime"
            );
            self.runtime.context = checkpoint.context;
            self.runtime.state = checkpoint.state;
            self.runtime.status = checkpoint.status;
            self.runtime.history = checkpoint.history;
        }
    }
}

impl<S: State> MachineRuntime<S> {
    /// Create a stopped runtime at `initial`.
    pub fn create(
        definition: Arc<StateMachineDefinition<S>>,
        context: ContextValue,
        initial: S,
        actors: ActorRegistry,
    ) -> Result<Self, MachineError> {
        check_actors(&definition, &actors)?;

        let mut history = History::new();
        history.save_state(initial.clone());

        Ok(Self {
            id: Uuid::new_v4(),
            definition,
            actors,
            context: Context::create(context),
            state: initial,
            status: RuntimeStatus::Stopped,
            history,
        })
    }

    /// Rebuild a runtime from a snapshot.
    pub fn restore(
        definition: Arc<StateMachineDefinition<S>>,
        snapshot: Snapshot<S>,
        actors: ActorRegistry,
    ) -> Result<Self, MachineError> {
        if !definition.is_declared(&snapshot.state) {
            return Err(SnapshotError::StateInvalid {
                state: snapshot.state.name().to_string(),
            }
            .into());
        }
        check_actors(&definition, &actors)?;

        Ok(Self {
            id: Uuid::new_v4(),
            definition,
            actors,
            context: Context::create(snapshot.context),
            state: snapshot.state,
            status: snapshot.status,
            history: History::restore(snapshot.history),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn definition(&self) -> &StateMachineDefinition<S> {
        &self.definition
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn status(&self) -> RuntimeStatus {
        self.status
    }

    /// Detached copy of the context.
    pub fn context(&self) -> ContextValue {
        self.context.get_readonly()
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    pub fn get_snapshot(&self) -> Result<Snapshot<S>, MachineError> {
        if self.status == RuntimeStatus::Running {
            return Err(MachineError::IsRunning);
        }

        Ok(Snapshot {
            context: self.context.get_snapshot(),
            state: self.state.clone(),
            status: self.status,
            history: self.history.get_snapshot(),
        })
    }

    /// Run automatic transitions from the initial state until none applies
    /// or a final state is reached.
    pub async fn start(&mut self) -> Result<(), MachineError> {
        if self.status != RuntimeStatus::Stopped {
            return Err(MachineError::NotStopped {
                status: self.status,
            });
        }

        let tx = Transaction::begin(self);
        tx.runtime.status = RuntimeStatus::Running;
        tx.runtime.advance(None).await?;
        tx.runtime.settle();
        tx.commit();
        Ok(())
    }

    /// Take the transition selected by `command`, then any automatic ones.
    pub async fn execute(&mut self, command: Command) -> Result<(), MachineError> {
        if self.status != RuntimeStatus::Pending {
            return Err(MachineError::NotPending {
                status: self.status,
            });
        }

        let tx = Transaction::begin(self);
        tx.runtime.status = RuntimeStatus::Running;
        tx.runtime.history.save_command(command.clone());
        tx.runtime.advance(Some(&command)).await?;
        tx.runtime.settle();
        tx.commit();
        Ok(())
    }

    /// Guard-unaware check that a transition named `name` leaves the
    /// current state.
    pub fn can_accept_command(&self, name: &str) -> bool {
        self.status == RuntimeStatus::Pending
            && self
                .definition
                .transitions()
                .iter()
                .any(|t| t.is(name) && t.can_transition_from(&self.state))
    }

    /// Guard-aware check that `execute(command)` would find a transition.
    pub fn can_execute_command(&self, command: &Command) -> bool {
        self.status == RuntimeStatus::Pending
            && self.plan(&self.definition, Some(command)).is_some()
    }

    pub fn get_acceptable_commands(&self) -> Vec<&str> {
        self.definition
            .command_names()
            .into_iter()
            .filter(|name| self.can_accept_command(name))
            .collect()
    }

    fn settle(&mut self) {
        self.status = if self.definition.is_final(&self.state) {
            RuntimeStatus::Done
        } else {
            RuntimeStatus::Pending
        };
        info!(
            runtime_id = %self.id,
            state = self.state.name(),
            status = %self.status,
            "Runtime settled"
        );
    }

    /// First applicable transition, in declaration order, whose effect
    /// guard passes.
    fn plan<'d>(
        &self,
        definition: &'d StateMachineDefinition<S>,
        command: Option<&Command>,
    ) -> Option<Plan<'d, S>> {
        let automatic = Command::default();
        let trigger = command.unwrap_or(&automatic);

        definition
            .transitions()
            .iter()
            .filter(|transition| match command {
                Some(command) => transition.is(command.name()),
                None => !transition.is_manual(),
            })
            .filter(|transition| transition.can_transition_from(&self.state))
            .find_map(|transition| {
                let effect = definition.transition_effect(transition);
                let allowed =
                    effect.is_none_or(|effect| effect.test_guard(self.context.value(), trigger));
                allowed.then_some((transition, effect))
            })
    }

    async fn advance(&mut self, command: Option<&Command>) -> Result<(), MachineError> {
        let definition = Arc::clone(&self.definition);
        let limit = definition.config().max_chain;
        let mut taken = 0;

        if let Some(command) = command {
            let (transition, effect) =
                self.plan(&definition, Some(command))
                    .ok_or_else(|| MachineError::NoTransition {
                        command: command.name().to_string(),
                        state: self.state.name().to_string(),
                    })?;
            if taken >= limit {
                return Err(MachineError::ChainLimitExceeded { limit });
            }
            self.take(transition, effect, command).await?;
            taken += 1;
        }

        let automatic = Command::default();
        while !definition.is_final(&self.state) {
            let Some((transition, effect)) = self.plan(&definition, None) else {
                break;
            };
            if taken >= limit {
                return Err(MachineError::ChainLimitExceeded { limit });
            }
            self.take(transition, effect, &automatic).await?;
            taken += 1;
        }

        Ok(())
    }

    async fn take(
        &mut self,
        transition: &Transition<S>,
        effect: Option<&Effect<S>>,
        command: &Command,
    ) -> Result<(), MachineError> {
        let target = transition.get_target(&self.state)?;
        debug!(
            runtime_id = %self.id,
            from = self.state.name(),
            to = target.name(),
            command = command.name(),
            "Taking transition"
        );

        if let Some(effect) = effect {
            self.run_effect(effect, command).await?;
        }
        self.change_state(target).await
    }

    /// Exit hooks of the current state, the move itself, then enter hooks
    /// of the new state.
    async fn change_state(&mut self, target: S) -> Result<(), MachineError> {
        let definition = Arc::clone(&self.definition);
        let hook = Command::default();

        for effect in definition.exit_effects(&self.state) {
            if effect.test_guard(self.context.value(), &hook) {
                self.run_effect(effect, &hook).await?;
            }
        }

        debug!(
            runtime_id = %self.id,
            from = self.state.name(),
            to = target.name(),
            "Changing state"
        );
        self.state = target;
        self.history.save_state(self.state.clone());

        for effect in definition.enter_effects(&self.state) {
            if effect.test_guard(self.context.value(), &hook) {
                self.run_effect(effect, &hook).await?;
            }
        }

        Ok(())
    }

    async fn run_effect(&mut self, effect: &Effect<S>, command: &Command) -> Result<(), MachineError> {
        let mut steps = effect.execute(&self.context.get_readonly(), command);
        let mut outcome = steps.start()?;

        while let StepOutcome::Yield(result) = outcome {
            let payload = self.resolve(result).await?;
            outcome = steps.resume(payload)?;
        }

        Ok(())
    }

    async fn resolve(&mut self, result: ActionResult) -> Result<Payload, MachineError> {
        match result {
            ActionResult::Call(call) => Ok(call.await?),
            ActionResult::Assign(descriptor) => match descriptor.patch {
                Value::Object(partial) => {
                    self.context = self.context.merge(partial);
                    Ok(Payload::Value(Value::Null))
                }
                other => Err(MachineError::InvalidAssign(other.to_string())),
            },
            ActionResult::Invoke(request) => {
                let actor = self
                    .actors
                    .get(&request.actor)
                    .cloned()
                    .ok_or_else(|| MachineError::UnknownActor(request.actor.clone()))?;
                debug!(runtime_id = %self.id, actor = %request.actor, "Invoking actor");
                Ok(Payload::Value(actor(request.params).await?))
            }
        }
    }
}

impl<S: State> fmt::Debug for MachineRuntime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineRuntime")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("status", &self.status)
            .field("context", self.context.value())
            .field("actors", &self.actors)
            .finish()
    }
}

fn check_actors<S: State>(
    definition: &StateMachineDefinition<S>,
    actors: &ActorRegistry,
) -> Result<(), MachineError> {
    let missing = actors.missing(definition.declared_actors());
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MachineError::MissingActors(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMachineBuilder;
    use crate::core::Endpoint;
    use crate::effects::{assign, invoke, Action, ActionError, EffectCondition};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Map};
    use std::time::Duration;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Step {
        Start,
        Intermediate,
        End,
        UnreachableEnd,
    }

    impl State for Step {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Intermediate => "Intermediate",
                Self::End => "End",
                Self::UnreachableEnd => "UnreachableEnd",
            }
        }
    }

    fn object(value: Value) -> ContextValue {
        value.as_object().cloned().unwrap()
    }

    fn chain() -> StateMachineBuilder<Step> {
        StateMachineBuilder::new()
            .initial(Step::Start)
            .command(Step::Start, Step::Intermediate, "go")
            .automatic(Step::Intermediate, Step::End)
            .automatic(Step::End, Step::UnreachableEnd)
            .final_state(Step::End)
    }

    #[tokio::test]
    async fn created_runtime_is_stopped_with_seeded_history() {
        let runtime = chain().build().unwrap().run(Map::new(), ActorRegistry::new()).unwrap();

        assert_eq!(runtime.status(), RuntimeStatus::Stopped);
        assert_eq!(runtime.state(), &Step::Start);
        assert_eq!(runtime.history().path(), vec![&Step::Start]);
    }

    #[tokio::test]
    async fn start_twice_fails_with_not_stopped() {
        let mut runtime = chain().build().unwrap().run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();

        let err = runtime.start().await.unwrap_err();
        assert!(matches!(
            err,
            MachineError::NotStopped {
                status: RuntimeStatus::Pending
            }
        ));
    }

    #[tokio::test]
    async fn execute_before_start_fails_with_not_pending() {
        let mut runtime = chain().build().unwrap().run(Map::new(), ActorRegistry::new()).unwrap();

        let err = runtime.execute(Command::new("go")).await.unwrap_err();
        assert!(matches!(err, MachineError::NotPending { .. }));
        assert!(runtime.history().commands().is_empty());
    }

    #[tokio::test]
    async fn chase_stops_at_final_state() {
        let mut runtime = chain().build().unwrap().run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();
        runtime.execute(Command::new("go")).await.unwrap();

        assert_eq!(runtime.state(), &Step::End);
        assert_eq!(runtime.status(), RuntimeStatus::Done);

        let err = runtime.execute(Command::new("go")).await.unwrap_err();
        assert!(matches!(err, MachineError::NotPending { status: RuntimeStatus::Done }));
    }

    #[tokio::test]
    async fn unknown_command_fails_with_no_transition_and_leaves_no_trace() {
        let mut runtime = chain().build().unwrap().run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();
        let before = runtime.history().clone();

        let err = runtime.execute(Command::new("fly")).await.unwrap_err();
        assert!(matches!(err, MachineError::NoTransition { .. }));
        assert_eq!(runtime.history(), &before);
        assert_eq!(runtime.status(), RuntimeStatus::Pending);
    }

    #[tokio::test]
    async fn snapshot_is_refused_while_running() {
        let mut runtime = chain().build().unwrap().run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.status = RuntimeStatus::Running;

        assert!(matches!(runtime.get_snapshot(), Err(MachineError::IsRunning)));
    }

    #[tokio::test]
    async fn dropped_call_is_rolled_back() {
        let definition = chain()
            .actor("never")
            .effect(
                Effect::on(EffectCondition::enter(Step::Intermediate))
                    .action(|_, _| Action::from(assign(json!({ "entered": true }))).then(invoke("never", vec![]))),
            )
            .build()
            .unwrap();
        let actors = ActorRegistry::new().register_async("never", |_params: Vec<Value>| {
            futures::future::pending::<Result<Value, ActionError>>()
        });
        let mut runtime = definition.run(Map::new(), actors).unwrap();
        runtime.start().await.unwrap();

        let result =
            tokio::time::timeout(Duration::from_millis(20), runtime.execute(Command::new("go"))).await;

        assert!(result.is_err());
        assert_eq!(runtime.state(), &Step::Start);
        assert_eq!(runtime.status(), RuntimeStatus::Pending);
        assert!(runtime.context().is_empty());
        assert!(runtime.history().commands().is_empty());
    }

    #[tokio::test]
    async fn automatic_cycle_hits_chain_limit() {
        #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
        enum Ping {
            A,
            B,
        }

        impl State for Ping {
            fn name(&self) -> &str {
                match self {
                    Self::A => "A",
                    Self::B => "B",
                }
            }
        }

        let definition = StateMachineBuilder::new()
            .initial(Ping::A)
            .automatic(Ping::A, Ping::B)
            .automatic(Ping::B, Ping::A)
            .max_chain(10)
            .build()
            .unwrap();
        let mut runtime = definition.run(Map::new(), ActorRegistry::new()).unwrap();

        let err = runtime.start().await.unwrap_err();
        assert!(matches!(err, MachineError::ChainLimitExceeded { limit: 10 }));
        assert_eq!(runtime.status(), RuntimeStatus::Stopped);
        assert_eq!(runtime.state(), &Ping::A);
        assert_eq!(runtime.history().entries().len(), 1);
    }

    #[tokio::test]
    async fn commanded_transition_counts_against_chain_limit() {
        let definition = StateMachineBuilder::new()
            .initial(Step::Start)
            .command(Step::Start, Step::End, "finish")
            .max_chain(0)
            .build()
            .unwrap();
        let mut runtime = definition.run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();

        let err = runtime.execute(Command::new("finish")).await.unwrap_err();
        assert!(matches!(err, MachineError::ChainLimitExceeded { limit: 0 }));
        assert_eq!(runtime.state(), &Step::Start);
        assert_eq!(runtime.status(), RuntimeStatus::Pending);
        assert!(runtime.history().commands().is_empty());
    }

    #[tokio::test]
    async fn chain_limit_includes_commanded_transition() {
        let definition = chain().max_chain(1).build().unwrap();
        let mut runtime = definition.run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();

        let err = runtime.execute(Command::new("go")).await.unwrap_err();
        assert!(matches!(err, MachineError::ChainLimitExceeded { limit: 1 }));
        assert_eq!(runtime.state(), &Step::Start);
    }

    #[tokio::test]
    async fn assigning_a_non_object_fails() {
        let definition = chain()
            .effect(
                Effect::on(EffectCondition::transition(Step::Start, Step::Intermediate))
                    .action(|_, _| Action::from(assign(json!([1, 2])))),
            )
            .build()
            .unwrap();
        let mut runtime = definition.run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();

        let err = runtime.execute(Command::new("go")).await.unwrap_err();
        assert!(matches!(err, MachineError::InvalidAssign(_)));
        assert_eq!(runtime.state(), &Step::Start);
    }

    #[tokio::test]
    async fn unregistered_actor_fails_at_invoke() {
        let definition = chain()
            .effect(
                Effect::on(EffectCondition::transition(Step::Start, Step::Intermediate))
                    .action(|_, _| Action::from(invoke("ghost", vec![]))),
            )
            .build()
            .unwrap();
        let mut runtime = definition.run(Map::new(), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();

        let err = runtime.execute(Command::new("go")).await.unwrap_err();
        assert!(matches!(err, MachineError::UnknownActor(name) if name == "ghost"));
    }

    #[test]
    fn declared_actor_must_be_registered() {
        let definition = chain().actor("mailer").build().unwrap();

        let err = definition.run(Map::new(), ActorRegistry::new()).unwrap_err();
        assert!(matches!(err, MachineError::MissingActors(names) if names == vec!["mailer".to_string()]));
    }

    #[test]
    fn restore_rejects_undeclared_state() {
        let definition = StateMachineBuilder::new()
            .initial(Step::Start)
            .command(Step::Start, Step::End, "finish")
            .build()
            .unwrap();
        let snapshot = Snapshot {
            context: Map::new(),
            state: Step::Intermediate,
            status: RuntimeStatus::Pending,
            history: History::new().get_snapshot(),
        };

        let err = definition
            .restore_runtime(snapshot, ActorRegistry::new())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MachineError::Snapshot(SnapshotError::StateInvalid { .. })
        ));
    }

    #[tokio::test]
    async fn wildcard_target_reenters_current_state() {
        let definition = StateMachineBuilder::new()
            .initial(Step::Start)
            .command(Step::Start, Endpoint::Any, "poke")
            .effect(Effect::on(EffectCondition::enter(Step::Start)).action(|context, _| {
                let n = context.get("entered").and_then(Value::as_i64).unwrap_or(0);
                Action::from(assign(json!({ "entered": n + 1 })))
            }))
            .build()
            .unwrap();
        let mut runtime = definition.run(object(json!({})), ActorRegistry::new()).unwrap();
        runtime.start().await.unwrap();

        runtime.execute(Command::new("poke")).await.unwrap();
        runtime.execute(Command::new("poke")).await.unwrap();

        assert_eq!(runtime.state(), &Step::Start);
        assert_eq!(runtime.context()["entered"], json!(2));
    }
}
