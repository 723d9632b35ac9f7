//! Immutable machine definitions.

use crate::core::{Params, StateKind};
use crate::machine::transition::{Target, Transition};
use std::collections::HashMap;
use std::fmt;

/// The static shape of a machine: its initial state and transition table.
///
/// Built once by [`MachineBuilder`](crate::builder::MachineBuilder) and shared
/// behind an `Arc`. Every [`StateMachineCore`](crate::machine::StateMachineCore)
/// created from it, and every enclosing machine that nests it, reads the same
/// table; nothing mutates it after construction.
pub struct MachineDefinition<C = ()> {
    name: &'static str,
    kind: StateKind,
    initial: Target<C>,
    initial_params: Params<C>,
    transitions: Vec<Transition<C>>,
    index: HashMap<StateKind, Vec<usize>>,
    states: Vec<StateKind>,
}

impl<C> MachineDefinition<C> {
    pub(crate) fn new(
        name: &'static str,
        initial: Target<C>,
        initial_params: Params<C>,
        transitions: Vec<Transition<C>>,
    ) -> Self {
        let mut index: HashMap<StateKind, Vec<usize>> = HashMap::new();
        let mut states = vec![initial.kind()];
        for (position, transition) in transitions.iter().enumerate() {
            index.entry(transition.from).or_default().push(position);
            for kind in [transition.from, transition.to.kind()] {
                if !states.contains(&kind) {
                    states.push(kind);
                }
            }
        }
        Self {
            name,
            kind: StateKind::machine(name),
            initial,
            initial_params,
            transitions,
            index,
            states,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Kind under which an enclosing machine refers to this one.
    ///
    /// Unique per definition; two definitions sharing a name are different
    /// kinds.
    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn initial(&self) -> &Target<C> {
        &self.initial
    }

    pub fn initial_params(&self) -> &Params<C> {
        &self.initial_params
    }

    /// All transitions in declaration order.
    pub fn transitions(&self) -> &[Transition<C>] {
        &self.transitions
    }

    /// Transitions leaving `kind`, in declaration order.
    pub fn transitions_from(&self, kind: StateKind) -> impl Iterator<Item = &Transition<C>> + '_ {
        self.index
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&position| &self.transitions[position])
    }

    /// Every kind the definition mentions, initial state first.
    pub fn states(&self) -> &[StateKind] {
        &self.states
    }
}

impl<C> fmt::Debug for MachineDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDefinition")
            .field("name", &self.name)
            .field("initial", &self.initial.kind())
            .field("transitions", &self.transitions.len())
            .finish()
    }
}
