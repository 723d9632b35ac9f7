//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::{Condition, Construct, EventTag, Params, State, StateKind};
use crate::machine::{MachineDefinition, MachineRef, Target, Transition};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// Fluent builder for a [`Transition`].
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::TransitionBuilder;
/// use hsm_engine::core::State;
/// use hsm_engine::leaf_state;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Idle;
/// #[derive(Default)]
/// struct Cruise;
///
/// impl State for Idle {}
/// impl State for Cruise {}
/// leaf_state!(Idle, Cruise);
///
/// let transition = TransitionBuilder::<()>::new()
///     .from::<Idle>()
///     .to::<Cruise>()
///     .after(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(transition.describe(), "Idle -> Cruise [timeout: 5s]");
/// ```
pub struct TransitionBuilder<C = ()> {
    from: Option<StateKind>,
    to: Option<Target<C>>,
    condition: Option<Condition<C>>,
    params: Params<C>,
}

impl<C: Send + Sync + 'static> TransitionBuilder<C> {
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            condition: None,
            params: Params::new(),
        }
    }

    pub fn from<S: State<C>>(self) -> Self {
        self.from_kind(StateKind::of::<S>())
    }

    /// Leave a nested machine.
    pub fn from_machine(self, definition: &MachineDefinition<C>) -> Self {
        self.from_kind(definition.kind())
    }

    pub fn from_kind(mut self, kind: StateKind) -> Self {
        self.from = Some(kind);
        self
    }

    pub fn to<S: Construct<C>>(self) -> Self {
        self.to_target(Target::state::<S>())
    }

    /// Enter a nested machine.
    pub fn to_machine(self, definition: Arc<MachineDefinition<C>>) -> Self {
        self.to_target(Target::machine(definition))
    }

    pub fn to_final(self) -> Self {
        self.to_target(Target::finished())
    }

    pub fn to_failed(self) -> Self {
        self.to_target(Target::failed())
    }

    pub fn to_target(mut self, target: Target<C>) -> Self {
        self.to = Some(target);
        self
    }

    pub fn when(mut self, condition: Condition<C>) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn after(self, timeout: Duration) -> Self {
        self.when(Condition::timeout(timeout))
    }

    pub fn on(self, tag: impl Into<EventTag>) -> Self {
        self.when(Condition::event(tag))
    }

    pub fn when_fn<F>(self, name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.when(Condition::when(name, check))
    }

    pub fn when_state<S, F>(self, name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        S: State<C>,
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.when(Condition::when_state(name, check))
    }

    pub fn on_child_finished(self) -> Self {
        self.when(Condition::ChildFinished)
    }

    pub fn on_child_failed(self) -> Self {
        self.when(Condition::ChildFailed)
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params = self.params.literal(name, value);
        self
    }

    pub fn param_fn<F, V>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.params = self.params.computed(name, factory);
        self
    }

    pub fn param_with<F, V>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&MachineRef<C>) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.params = self.params.computed_with(name, factory);
        self
    }

    pub fn params(mut self, params: Params<C>) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<Transition<C>, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;
        let condition = self.condition.ok_or(BuildError::MissingCondition)?;

        Ok(Transition {
            from,
            to,
            condition,
            params: self.params,
        })
    }
}

impl<C: Send + Sync + 'static> Default for TransitionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Initial;
    #[derive(Default)]
    struct Processing;

    impl State for Initial {}
    impl State for Processing {}

    crate::leaf_state!(Initial, Processing);

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::<()>::new().to::<Processing>().build();
        assert!(matches!(result, Err(BuildError::MissingFromState)));

        let result = TransitionBuilder::<()>::new().from::<Initial>().build();
        assert!(matches!(result, Err(BuildError::MissingToState)));

        let result = TransitionBuilder::<()>::new()
            .from::<Initial>()
            .to::<Processing>()
            .build();
        assert!(matches!(result, Err(BuildError::MissingCondition)));
    }

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionBuilder::<()>::new()
            .from::<Initial>()
            .to::<Processing>()
            .on("go")
            .param("x", 1)
            .param_fn("y", || 2)
            .build()
            .unwrap();

        assert_eq!(transition.from, StateKind::of::<Initial>());
        assert_eq!(transition.to.kind(), StateKind::of::<Processing>());
        assert_eq!(transition.condition.label(), "event: go");
        assert_eq!(transition.params.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn later_condition_replaces_earlier() {
        let transition = TransitionBuilder::<()>::new()
            .from::<Initial>()
            .to_final()
            .after(Duration::from_secs(1))
            .when_fn("ready", || true)
            .build()
            .unwrap();

        assert_eq!(transition.condition.label(), "ready");
        assert!(transition.to.kind().is_final());
    }
}
