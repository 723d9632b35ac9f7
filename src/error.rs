//! Runtime error type for the engine.

use thiserror::Error;

/// Errors raised while constructing, stepping, or running a machine.
///
/// Definition-time problems are reported separately by
/// [`BuildError`](crate::builder::BuildError).
#[derive(Debug, Error)]
pub enum HsmError {
    /// A child-completion condition was evaluated against a leaf state.
    #[error("Condition '{condition}' requires a nested machine, but current state '{state}' is a leaf")]
    NotAMachine { condition: String, state: String },

    /// A state-aware predicate was declared for a different state type.
    #[error("Condition '{condition}' expects state '{expected}', found '{found}'")]
    StateMismatch {
        condition: String,
        expected: String,
        found: String,
    },

    /// Resolved construction parameters do not fit the state's configuration.
    #[error("Invalid construction parameters for state '{state}': {source}")]
    InvalidParams {
        state: String,
        #[source]
        source: serde_json::Error,
    },

    /// Event payload could not be encoded or decoded.
    #[error("Invalid payload for event '{tag}': {source}")]
    InvalidPayload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },

    /// A state hook reported failure.
    #[error("State '{state}' failed: {message}")]
    Behavior { state: String, message: String },

    #[error("Invalid runner configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn run loop thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The run loop thread panicked.
    #[error("Run loop of machine '{machine}' panicked")]
    Panicked { machine: String },
}

impl HsmError {
    /// Shorthand for a failing state hook.
    pub fn behavior(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Behavior {
            state: state.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_error_names_state() {
        let err = HsmError::behavior("Latch", "gripper jammed");
        assert_eq!(err.to_string(), "State 'Latch' failed: gripper jammed");
    }

    #[test]
    fn not_a_machine_identifies_condition() {
        let err = HsmError::NotAMachine {
            condition: "child finished".to_string(),
            state: "Idle".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("child finished"));
        assert!(message.contains("Idle"));
    }

    #[test]
    fn invalid_params_keeps_source() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = HsmError::InvalidParams {
            state: "Cruise".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
