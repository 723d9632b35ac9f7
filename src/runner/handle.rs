//! Handle to a machine running on its own thread, and the outcome it reports.

use crate::core::Event;
use crate::error::HsmError;
use crate::machine::{EventSender, StateMachineCore};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

/// Why a run loop terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    /// The root machine reached FINAL.
    Finished,
    /// The root machine reached FAILED.
    Failed,
    /// A stop was requested.
    Stopped,
}

/// Outcome of a terminated run loop.
#[derive(Debug)]
pub struct RunReport<C = ()> {
    pub run_id: Uuid,
    pub completion: Completion,
    /// Ticks the root machine executed
    pub ticks: u64,
    /// The root machine as it was when the loop exited
    pub machine: StateMachineCore<C>,
}

/// Control surface of a started machine.
///
/// Dropping the handle detaches the thread; the machine keeps running until
/// it terminates on its own.
pub struct MachineHandle<C = ()> {
    pub(crate) name: String,
    pub(crate) run_id: Uuid,
    pub(crate) sender: EventSender,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) thread: JoinHandle<Result<RunReport<C>, HsmError>>,
}

impl<C> MachineHandle<C> {
    /// Enqueue an event. Never blocks.
    pub fn send(&self, event: Event) {
        self.sender.send(event);
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Request cooperative termination; observed at the start of the next tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Whether the run loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Block until the run loop exits.
    pub fn join(self) -> Result<RunReport<C>, HsmError> {
        let Self { name, thread, .. } = self;
        thread
            .join()
            .map_err(|_| HsmError::Panicked { machine: name })?
    }
}

impl<C> std::fmt::Debug for MachineHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineHandle")
            .field("name", &self.name)
            .field("run_id", &self.run_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_serializes_as_variant_name() {
        assert_eq!(serde_json::to_string(&Completion::Finished).unwrap(), "\"Finished\"");
        let back: Completion = serde_json::from_str("\"Stopped\"").unwrap();
        assert_eq!(back, Completion::Stopped);
    }
}
