//! The immutable machine aggregate produced by the builder.

use super::actors::ActorRegistry;
use super::error::MachineError;
use super::runtime::MachineRuntime;
use crate::builder::BuildError;
use crate::core::{ContextValue, Endpoint, State, Transition};
use crate::effects::{Effect, EffectCondition};
use crate::snapshot::Snapshot;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Upper bound on transitions taken by a single `start`/`execute` call
/// unless configured otherwise.
pub const DEFAULT_MAX_CHAIN: usize = 1000;

/// Initial and final states plus execution limits.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineConfig<S: State> {
    pub initial: S,
    pub final_states: Vec<S>,
    /// Most transitions one call may take before it is aborted.
    pub max_chain: usize,
}

impl<S: State> MachineConfig<S> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            final_states: Vec::new(),
            max_chain: DEFAULT_MAX_CHAIN,
        }
    }
}

/// Transition graph, configuration, effects and declared actor names.
///
/// Definitions are values: [`add_effect`](Self::add_effect) returns a new
/// definition and leaves the original untouched, so machines derived from a
/// common base never share mutable state.
#[derive(Clone, Debug)]
pub struct StateMachineDefinition<S: State> {
    transitions: Vec<Transition<S>>,
    config: MachineConfig<S>,
    effects: Vec<Effect<S>>,
    actors: Vec<String>,
}

impl<S: State> StateMachineDefinition<S> {
    /// Assemble and validate a definition.
    pub(crate) fn new(
        transitions: Vec<Transition<S>>,
        config: MachineConfig<S>,
        effects: Vec<Effect<S>>,
        actors: Vec<String>,
    ) -> Result<Self, BuildError> {
        let definition = Self::assemble(transitions, config, effects, actors);
        into_result(definition.validate())?;
        Ok(definition)
    }

    /// Assemble without validating.
    pub(crate) fn assemble(
        transitions: Vec<Transition<S>>,
        config: MachineConfig<S>,
        effects: Vec<Effect<S>>,
        actors: Vec<String>,
    ) -> Self {
        Self {
            transitions,
            config,
            effects,
            actors,
        }
    }

    /// Check every construction invariant, accumulating all violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<BuildError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = Vec::new();

        checks.push(self.check_declared("initial", &self.config.initial));
        for state in &self.config.final_states {
            checks.push(self.check_declared("final", state));
        }
        checks.extend(check_duplicated_effects(&self.effects));

        Validation::all_vec(checks).map(|_| ())
    }

    fn check_declared(&self, role: &'static str, state: &S) -> Validation<(), NonEmptyVec<BuildError>> {
        if self.is_declared(state) {
            Validation::success(())
        } else {
            Validation::fail(BuildError::UndeclaredState {
                role,
                state: state.name().to_string(),
            })
        }
    }

    /// A copy of this definition with `effect` added.
    ///
    /// Fails with `DuplicatedEffect` if a transition-scoped effect for the
    /// same edge already exists.
    pub fn add_effect(&self, effect: Effect<S>) -> Result<Self, BuildError> {
        let mut effects = self.effects.clone();
        effects.push(effect);
        into_result(Validation::all_vec(check_duplicated_effects(&effects)).map(|_| ()))?;

        Ok(Self {
            effects,
            ..self.clone()
        })
    }

    pub fn transitions(&self) -> &[Transition<S>] {
        &self.transitions
    }

    pub fn config(&self) -> &MachineConfig<S> {
        &self.config
    }

    pub fn effects(&self) -> &[Effect<S>] {
        &self.effects
    }

    pub fn declared_actors(&self) -> &[String] {
        &self.actors
    }

    /// Every concrete state named as a transition endpoint, in declaration order.
    pub fn states(&self) -> Vec<&S> {
        let mut states: Vec<&S> = Vec::new();
        for transition in &self.transitions {
            for endpoint in [&transition.from, &transition.to] {
                if let Some(state) = endpoint.as_state() {
                    if !states.contains(&state) {
                        states.push(state);
                    }
                }
            }
        }
        states
    }

    pub fn is_declared(&self, state: &S) -> bool {
        self.transitions.iter().any(|transition| {
            transition.from.as_state() == Some(state) || transition.to.as_state() == Some(state)
        })
    }

    pub fn is_final(&self, state: &S) -> bool {
        self.config.final_states.contains(state)
    }

    /// Names of all manual transitions, deduplicated, in declaration order.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.transitions.iter().filter_map(|t| t.name.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// The effect declared for exactly this edge, if any.
    pub fn transition_effect(&self, transition: &Transition<S>) -> Option<&Effect<S>> {
        self.effects
            .iter()
            .find(|effect| effect.matches_transition(transition))
    }

    pub fn enter_effects(&self, state: &S) -> Vec<&Effect<S>> {
        self.effects
            .iter()
            .filter(|effect| effect.matches_enter(state))
            .collect()
    }

    pub fn exit_effects(&self, state: &S) -> Vec<&Effect<S>> {
        self.effects
            .iter()
            .filter(|effect| effect.matches_exit(state))
            .collect()
    }

    /// Create a stopped runtime at the initial state.
    pub fn run(
        &self,
        context: ContextValue,
        actors: ActorRegistry,
    ) -> Result<MachineRuntime<S>, MachineError> {
        MachineRuntime::create(
            Arc::new(self.clone()),
            context,
            self.config.initial.clone(),
            actors,
        )
    }

    /// Rebuild a runtime from a snapshot taken earlier.
    pub fn restore_runtime(
        &self,
        snapshot: Snapshot<S>,
        actors: ActorRegistry,
    ) -> Result<MachineRuntime<S>, MachineError> {
        MachineRuntime::restore(Arc::new(self.clone()), snapshot, actors)
    }
}

fn check_duplicated_effects<S: State>(
    effects: &[Effect<S>],
) -> Vec<Validation<(), NonEmptyVec<BuildError>>> {
    let mut seen: Vec<(&Endpoint<S>, &Endpoint<S>)> = Vec::new();
    let mut checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = Vec::new();

    for effect in effects {
        if let EffectCondition::Transition { from, to } = effect.condition() {
            let check = if seen.contains(&(from, to)) {
                Validation::fail(BuildError::DuplicatedEffect {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            } else {
                seen.push((from, to));
                Validation::success(())
            };
            checks.push(check);
        }
    }

    checks
}

/// Fold accumulated violations into a single error.
pub(crate) fn into_result(validation: Validation<(), NonEmptyVec<BuildError>>) -> Result<(), BuildError> {
    match validation {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => {
            let mut errors: Vec<BuildError> = errors.iter().cloned().collect();
            if errors.len() == 1 {
                Err(errors.remove(0))
            } else {
                Err(BuildError::Invalid(errors))
            }
        }
    }
}
