//! Build errors for machine and transition builders.

use std::fmt;
use thiserror::Error;

/// A single problem found in a machine definition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("Initial state not specified. Call .initial::<S>() before .build()")]
    MissingInitialState,

    #[error("Transition #{index} leaves sentinel state '{from}'; FINAL and FAILED have no outgoing transitions")]
    TransitionFromSentinel { index: usize, from: String },

    #[error("Transition #{index} waits for an event with an empty tag")]
    EmptyEventTag { index: usize },
}

/// All problems found in one definition, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionErrors(pub Vec<DefinitionError>);

impl DefinitionErrors {
    pub fn iter(&self) -> impl Iterator<Item = &DefinitionError> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Machine '{machine}' is malformed: {errors}")]
    Invalid {
        machine: String,
        errors: DefinitionErrors,
    },

    #[error("Transition source state not specified. Call .from::<S>()")]
    MissingFromState,

    #[error("Transition target state not specified. Call .to::<S>()")]
    MissingToState,

    #[error("Transition condition not specified. Call .when(condition)")]
    MissingCondition,
}
