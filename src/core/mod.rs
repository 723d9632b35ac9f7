//! Core building blocks of a machine.
//!
//! This module contains everything a machine is assembled from:
//! - Events and their tags
//! - The `State` contract, state kinds, and the FINAL/FAILED sentinels
//! - Guard conditions and their evaluation
//! - Construction parameters and their resolve step
//! - Time sources and transition history

mod clock;
mod condition;
mod event;
mod history;
mod params;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::{Condition, Evaluation, Predicate};
pub use event::{Event, EventTag};
pub use history::{StateHistory, TransitionRecord, DEFAULT_HISTORY_LIMIT};
pub use params::{Factory, ParamValue, Params};
pub use state::{AsAny, Construct, Failed, Final, State, StateKind, StateResult};
