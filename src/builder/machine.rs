//! Builder for constructing machine definitions.

use crate::builder::error::{BuildError, DefinitionErrors};
use crate::builder::transition::TransitionBuilder;
use crate::builder::validate::validate_definition;
use crate::core::{Construct, Params};
use crate::machine::{MachineDefinition, Target, Transition};
use std::sync::Arc;
use stillwater::validation::Validation;

/// Fluent builder for a [`MachineDefinition`].
///
/// Transitions may be added in any number of steps; the definition is frozen
/// by [`build`](MachineBuilder::build).
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::{timeout_transition, MachineBuilder};
/// use hsm_engine::core::{Final, State};
/// use hsm_engine::leaf_state;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Warmup;
/// impl State for Warmup {}
/// leaf_state!(Warmup);
///
/// let definition = MachineBuilder::<()>::new("Boot")
///     .initial::<Warmup>()
///     .transition(timeout_transition::<Warmup, Final, ()>(Duration::from_millis(50)))
///     .build()
///     .unwrap();
/// assert_eq!(definition.transitions().len(), 1);
/// ```
pub struct MachineBuilder<C = ()> {
    name: &'static str,
    initial: Option<Target<C>>,
    initial_params: Params<C>,
    transitions: Vec<Transition<C>>,
}

impl<C: Send + Sync + 'static> MachineBuilder<C> {
    /// `name` is also the kind under which an enclosing machine nests this one.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            initial: None,
            initial_params: Params::new(),
            transitions: Vec::new(),
        }
    }

    pub fn initial<S: Construct<C>>(self) -> Self {
        self.initial_target(Target::state::<S>())
    }

    /// Start inside a nested machine.
    pub fn initial_machine(self, definition: Arc<MachineDefinition<C>>) -> Self {
        self.initial_target(Target::machine(definition))
    }

    pub fn initial_target(mut self, target: Target<C>) -> Self {
        self.initial = Some(target);
        self
    }

    /// Construction parameters for the initial state.
    pub fn initial_params(mut self, params: Params<C>) -> Self {
        self.initial_params = params;
        self
    }

    pub fn transition(mut self, transition: Transition<C>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add a transition from a [`TransitionBuilder`], failing if it is incomplete.
    pub fn transition_with(mut self, builder: TransitionBuilder<C>) -> Result<Self, BuildError> {
        let transition = builder.build()?;
        self.transitions.push(transition);
        Ok(self)
    }

    pub fn transitions(mut self, transitions: Vec<Transition<C>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Register a transition without consuming the builder.
    pub fn add_transition(&mut self, transition: Transition<C>) -> &mut Self {
        self.transitions.push(transition);
        self
    }

    pub fn build(self) -> Result<Arc<MachineDefinition<C>>, BuildError> {
        let invalid = |errors: Vec<_>| BuildError::Invalid {
            machine: self.name.to_string(),
            errors: DefinitionErrors(errors),
        };

        if let Validation::Failure(errors) =
            validate_definition(self.initial.as_ref(), &self.transitions)
        {
            return Err(invalid(errors.iter().cloned().collect()));
        }
        let Some(initial) = self.initial else {
            return Err(invalid(vec![
                crate::builder::error::DefinitionError::MissingInitialState,
            ]));
        };

        Ok(Arc::new(MachineDefinition::new(
            self.name,
            initial,
            self.initial_params,
            self.transitions,
        )))
    }
}
