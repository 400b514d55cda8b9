//! Builder for constructing state machine definitions.

use crate::builder::error::BuildError;
use crate::core::{Endpoint, State, Transition};
use crate::effects::Effect;
use crate::machine::{MachineConfig, StateMachineDefinition, DEFAULT_MAX_CHAIN};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for constructing state machine definitions with a fluent API.
///
/// ```rust
/// use waypoint::builder::StateMachineBuilder;
/// use waypoint::state_enum;
///
/// state_enum! {
///     enum Order {
///         Placed,
///         Paid,
///         Shipped,
///     }
/// }
///
/// let definition = StateMachineBuilder::new()
///     .initial(Order::Placed)
///     .command(Order::Placed, Order::Paid, "pay")
///     .automatic(Order::Paid, Order::Shipped)
///     .final_state(Order::Shipped)
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.command_names(), vec!["pay"]);
/// ```
pub struct StateMachineBuilder<S: State> {
    initial: Option<S>,
    final_states: Vec<S>,
    transitions: Vec<Transition<S>>,
    effects: Vec<Effect<S>>,
    actors: Vec<String>,
    max_chain: usize,
}

impl<S: State> StateMachineBuilder<S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            final_states: Vec::new(),
            transitions: Vec::new(),
            effects: Vec::new(),
            actors: Vec::new(),
            max_chain: DEFAULT_MAX_CHAIN,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Mark a state as final. Runtimes reaching it become `Done`.
    pub fn final_state(mut self, state: S) -> Self {
        if !self.final_states.contains(&state) {
            self.final_states.push(state);
        }
        self
    }

    /// Add an automatic transition, taken without a command.
    pub fn automatic(self, from: impl Into<Endpoint<S>>, to: impl Into<Endpoint<S>>) -> Self {
        self.add_transition(Transition::automatic(from, to))
    }

    /// Add a manual transition, taken by `execute` with a command of this name.
    pub fn command(
        self,
        from: impl Into<Endpoint<S>>,
        to: impl Into<Endpoint<S>>,
        name: impl Into<String>,
    ) -> Self {
        self.add_transition(Transition::manual(from, to, name))
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition<S>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: Vec<Transition<S>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    pub fn effect(mut self, effect: Effect<S>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Declare an actor that must be registered when a runtime is created.
    pub fn actor(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.actors.contains(&name) {
            self.actors.push(name);
        }
        self
    }

    pub fn max_chain(mut self, limit: usize) -> Self {
        self.max_chain = limit;
        self
    }

    /// Report every problem that would make `build` fail.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<BuildError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = Vec::new();

        if self.transitions.is_empty() {
            checks.push(Validation::fail(BuildError::NoTransitions));
        }
        match &self.initial {
            Some(initial) => checks.push(
                StateMachineDefinition::assemble(
                    self.transitions.clone(),
                    self.config(initial.clone()),
                    self.effects.clone(),
                    self.actors.clone(),
                )
                .validate(),
            ),
            None => checks.push(Validation::fail(BuildError::MissingInitialState)),
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the definition.
    /// Returns an error if required fields are missing or the graph is
    /// inconsistent.
    pub fn build(self) -> Result<StateMachineDefinition<S>, BuildError> {
        let initial = self.initial.clone().ok_or(BuildError::MissingInitialState)?;

        if self.transitions.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        let config = self.config(initial);
        StateMachineDefinition::new(self.transitions, config, self.effects, self.actors)
    }

    fn config(&self, initial: S) -> MachineConfig<S> {
        MachineConfig {
            initial,
            final_states: self.final_states.clone(),
            max_chain: self.max_chain,
        }
    }
}

impl<S: State> Default for StateMachineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
