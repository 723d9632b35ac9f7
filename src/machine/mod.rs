//! Machines: definitions, transitions, and the nestable execution core.
//!
//! A [`MachineDefinition`] is the immutable table; a [`StateMachineCore`] is
//! one live instance of it. Because the core implements
//! [`State`](crate::core::State), a definition can appear as a transition
//! target inside another definition via [`Target::machine`].

mod definition;
mod machine_ref;
mod queue;
mod state_machine;
mod transition;

pub use definition::MachineDefinition;
pub use machine_ref::MachineRef;
pub use queue::{EventQueue, EventSender};
pub use state_machine::StateMachineCore;
pub use transition::{Target, Transition};
