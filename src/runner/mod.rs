//! Driving the outermost machine: configuration, the tick loop, and the
//! handle to a loop running on its own thread.

mod config;
mod handle;
mod root;

pub use config::{RunnerConfig, DEFAULT_TICK_PERIOD_MS};
pub use handle::{Completion, MachineHandle, RunReport};
pub use root::RootRunner;
