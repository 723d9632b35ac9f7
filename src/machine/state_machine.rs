//! The nestable machine: transition table plus current-state stepping.
//!
//! A [`StateMachineCore`] owns exactly one current state instance and changes
//! it when a guard fires. It has no thread and no timer of its own; whoever
//! owns it calls [`advance`](StateMachineCore::advance) once per tick. A
//! [`RootRunner`](crate::runner::RootRunner) does that for the outermost
//! machine, and an enclosing machine does it for a nested one through the
//! [`State`] implementation below.

use crate::core::{Evaluation, Event, State, StateHistory, StateKind, StateResult, TransitionRecord};
use crate::error::HsmError;
use crate::machine::definition::MachineDefinition;
use crate::machine::machine_ref::MachineRef;
use crate::machine::transition::{Prepared, Transition};
use chrono::Utc;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A running instance of a [`MachineDefinition`].
pub struct StateMachineCore<C = ()> {
    definition: Arc<MachineDefinition<C>>,
    machine: MachineRef<C>,
    current: Box<dyn State<C>>,
    current_kind: StateKind,
    entered_at: Instant,
    active: bool,
    ticks: u64,
    history: StateHistory,
}

impl<C: Send + Sync + 'static> StateMachineCore<C> {
    /// Build the machine with its initial state constructed but not entered.
    ///
    /// `machine` becomes the back-reference of every state this core builds.
    pub fn new(definition: Arc<MachineDefinition<C>>, machine: MachineRef<C>) -> Result<Self, HsmError> {
        let params = definition.initial_params().resolve(&machine);
        let initial = definition.initial().prepare(&machine, params)?;
        Ok(Self::assemble(definition, machine, initial))
    }

    /// Decode everything a machine nested inside `parent` needs; the returned
    /// closure constructs it.
    pub(crate) fn prepare_nested(
        definition: Arc<MachineDefinition<C>>,
        parent: &MachineRef<C>,
        overrides: Map<String, Value>,
    ) -> Result<impl FnOnce() -> Self, HsmError> {
        let machine = parent.child(definition.name());
        let mut params = definition.initial_params().resolve(&machine);
        params.extend(overrides);
        let initial = definition.initial().prepare(&machine, params)?;
        Ok(move || Self::assemble(definition, machine, initial))
    }

    fn assemble(definition: Arc<MachineDefinition<C>>, machine: MachineRef<C>, initial: Prepared<C>) -> Self {
        let current = initial(&machine);
        Self {
            current_kind: definition.initial().kind(),
            entered_at: machine.now(),
            history: StateHistory::with_limit(machine.history_limit),
            definition,
            machine,
            current,
            active: false,
            ticks: 0,
        }
    }

    /// One tick: select and perform at most one transition, then step the
    /// (possibly new) current state with the same event.
    ///
    /// Returns the kind entered, if a transition fired.
    pub fn advance(&mut self, event: Option<&Event>) -> Result<Option<StateKind>, HsmError> {
        self.ticks += 1;
        let entered = self.check_transitions(event)?;
        self.current.step(event)?;
        Ok(entered)
    }

    /// Try the current kind's transitions in declaration order and fire the
    /// first whose condition holds.
    pub fn check_transitions(&mut self, event: Option<&Event>) -> Result<Option<StateKind>, HsmError> {
        let definition = Arc::clone(&self.definition);
        let elapsed = self.time_in_state();

        for transition in definition.transitions_from(self.current_kind) {
            let fired = {
                let eval = Evaluation {
                    state: self.current.as_ref(),
                    state_name: self.current_kind.name(),
                    event,
                    elapsed,
                };
                transition.condition.evaluate(&eval)?
            };
            if fired {
                self.change_state(transition)?;
                return Ok(Some(self.current_kind));
            }
        }
        Ok(None)
    }

    // decode -> exit -> construct -> stamp -> enter
    fn change_state(&mut self, transition: &Transition<C>) -> Result<(), HsmError> {
        let from = self.current_kind;
        let params = transition.params.resolve(&self.machine);
        let construct = transition.to.prepare(&self.machine, params)?;

        self.current.exit()?;
        self.current = construct(&self.machine);
        self.current_kind = transition.to.kind();
        self.entered_at = self.machine.now();

        self.history.record(TransitionRecord {
            machine: self.machine.path().to_string(),
            from: from.name().to_string(),
            to: self.current_kind.name().to_string(),
            tick: self.ticks,
            timestamp: Utc::now(),
        });
        tracing::debug!(
            machine = %self.machine.path(),
            from = %from,
            to = %self.current_kind,
            condition = %transition.condition.label(),
            tick = self.ticks,
            "state changed"
        );

        self.current.enter()
    }
}

impl<C: 'static> StateMachineCore<C> {
    pub fn definition(&self) -> &Arc<MachineDefinition<C>> {
        &self.definition
    }

    pub fn name(&self) -> &'static str {
        self.definition.name()
    }

    pub fn machine(&self) -> &MachineRef<C> {
        &self.machine
    }

    pub fn current_kind(&self) -> StateKind {
        self.current_kind
    }

    pub fn current_state(&self) -> &dyn State<C> {
        self.current.as_ref()
    }

    /// Names of the current state, descending through nested machines.
    pub fn current_path(&self) -> Vec<&'static str> {
        let mut path = vec![self.current_kind.name()];
        let mut state = self.current.as_ref();
        while let Some(nested) = state.as_machine() {
            path.push(nested.current_kind.name());
            state = nested.current.as_ref();
        }
        path
    }

    pub fn time_in_state(&self) -> Duration {
        self.machine.now().saturating_duration_since(self.entered_at)
    }

    pub fn is_finished(&self) -> bool {
        self.current_kind.is_final()
    }

    pub fn is_failed(&self) -> bool {
        self.current_kind.is_failed()
    }

    /// FINAL or FAILED reached.
    pub fn is_terminated(&self) -> bool {
        self.current_kind.is_terminal()
    }

    /// Whether the initial state has been entered.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks this machine has been advanced.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }
}

impl<C: 'static> StateMachineCore<C> {
    /// The current state as a concrete type.
    pub fn current_as<T: State<C>>(&self) -> Option<&T> {
        self.current.downcast_ref::<T>()
    }
}

impl<C: Send + Sync + 'static> State<C> for StateMachineCore<C> {
    fn enter(&mut self) -> StateResult {
        self.entered_at = self.machine.now();
        self.active = true;
        tracing::debug!(machine = %self.machine.path(), state = %self.current_kind, "machine entered");
        self.current.enter()
    }

    fn step(&mut self, event: Option<&Event>) -> StateResult {
        self.advance(event).map(|_| ())
    }

    fn exit(&mut self) -> StateResult {
        self.current.exit()
    }

    fn as_machine(&self) -> Option<&StateMachineCore<C>> {
        Some(self)
    }
}

impl<C> fmt::Debug for StateMachineCore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachineCore")
            .field("path", &self.machine.path())
            .field("current", &self.current_kind)
            .field("ticks", &self.ticks)
            .finish()
    }
}
