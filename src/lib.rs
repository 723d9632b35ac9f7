//! hsm-engine: a tick-driven hierarchical state machine engine
//!
//! Behaviour is expressed as a graph of states and guarded transitions. A
//! guard may be a timeout, an event tag, a predicate, a literal, or the
//! completion of a nested machine. A whole machine can stand in as a single
//! state inside a larger one.
//!
//! # Core Concepts
//!
//! - **State**: a unit of behaviour with `enter`, `step`, and `exit` hooks
//! - **Condition**: the guard on a transition, evaluated once per tick
//! - **Machine**: a transition table plus one current state; nestable
//! - **Runner**: the single loop that ticks the outermost machine
//!
//! # Example
//!
//! ```rust
//! use hsm_engine::builder::{event_transition, timeout_transition, MachineBuilder};
//! use hsm_engine::core::{Event, Final, ManualClock, State};
//! use hsm_engine::leaf_state;
//! use hsm_engine::runner::{Completion, RootRunner, RunnerConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Idle;
//! #[derive(Default)]
//! struct Moving;
//!
//! impl State for Idle {}
//! impl State for Moving {}
//! leaf_state!(Idle, Moving);
//!
//! let definition = MachineBuilder::new("Arm")
//!     .initial::<Idle>()
//!     .transition(timeout_transition::<Idle, Moving, ()>(Duration::from_secs(1)))
//!     .transition(event_transition::<Moving, Final, ()>("halt"))
//!     .build()
//!     .unwrap();
//!
//! let clock = Arc::new(ManualClock::new());
//! let mut runner =
//!     RootRunner::with_clock(definition, (), RunnerConfig::default(), clock.clone()).unwrap();
//!
//! runner.tick().unwrap();
//! clock.advance(Duration::from_secs(1));
//! runner.tick().unwrap();
//! assert_eq!(runner.core().current_path(), vec!["Moving"]);
//!
//! runner.send(Event::new("halt"));
//! assert_eq!(runner.tick().unwrap(), Some(Completion::Finished));
//! ```

pub mod builder;
pub mod core;
pub mod error;
pub mod graph;
pub mod machine;
pub mod runner;

// Re-export commonly used types
pub use builder::MachineBuilder;
pub use core::{Condition, Construct, Event, Failed, Final, State, StateKind, StateResult};
pub use error::HsmError;
pub use graph::TransitionGraph;
pub use machine::{MachineDefinition, MachineRef, StateMachineCore};
pub use runner::{Completion, MachineHandle, RootRunner, RunnerConfig};
