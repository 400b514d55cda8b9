//! Errors raised while assembling a state machine definition.

use thiserror::Error;

/// Errors that can occur when building a state machine definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("The {role} state '{state}' is not an endpoint of any transition")]
    UndeclaredState { role: &'static str, state: String },

    #[error("An effect for transition {from} -> {to} is already defined")]
    DuplicatedEffect { from: String, to: String },

    #[error("Definition has {count} violations: {0:?}", count = .0.len())]
    Invalid(Vec<BuildError>),
}

impl BuildError {
    /// Flattened list of the individual violations.
    pub fn violations(&self) -> Vec<&BuildError> {
        match self {
            Self::Invalid(errors) => errors.iter().flat_map(BuildError::violations).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_violation() {
        let error = BuildError::Invalid(vec![
            BuildError::NoTransitions,
            BuildError::DuplicatedEffect {
                from: "A".into(),
                to: "B".into(),
            },
        ]);

        assert_eq!(error.violations().len(), 2);
        assert!(error.to_string().starts_with("Definition has 2 violations"));
    }

    #[test]
    fn single_error_is_its_own_violation() {
        let error = BuildError::MissingInitialState;
        assert_eq!(error.violations(), vec![&BuildError::MissingInitialState]);
    }
}
