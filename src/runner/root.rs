//! The outermost machine's tick loop.

use crate::core::{Clock, Event, State, SystemClock};
use crate::error::HsmError;
use crate::machine::{EventQueue, EventSender, MachineDefinition, MachineRef, StateMachineCore};
use crate::runner::config::RunnerConfig;
use crate::runner::handle::{Completion, MachineHandle, RunReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, info_span, trace};
use uuid::Uuid;

/// Owns a root machine, its event queue, and the loop that ticks it.
///
/// Each tick dequeues at most one event, advances the machine with it, and
/// then sleeps for whatever remains of the tick period. Nested machines are
/// ticked by their parents with the same event, so the whole hierarchy runs
/// on this one loop.
///
/// [`tick`](RootRunner::tick) drives the machine by hand. [`run`](RootRunner::run)
/// blocks the calling thread and [`start`](RootRunner::start) moves the loop
/// to a thread of its own.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::{event_transition, MachineBuilder};
/// use hsm_engine::core::{Event, Final, State};
/// use hsm_engine::leaf_state;
/// use hsm_engine::runner::{Completion, RootRunner, RunnerConfig};
///
/// #[derive(Default)]
/// struct Listening;
/// impl State for Listening {}
/// leaf_state!(Listening);
///
/// let definition = MachineBuilder::new("Radio")
///     .initial::<Listening>()
///     .transition(event_transition::<Listening, Final, ()>("off"))
///     .build()
///     .unwrap();
///
/// let mut runner = RootRunner::new(definition, (), RunnerConfig::default()).unwrap();
/// assert_eq!(runner.tick().unwrap(), None);
/// runner.send(Event::new("off"));
/// assert_eq!(runner.tick().unwrap(), Some(Completion::Finished));
/// ```
pub struct RootRunner<C = ()> {
    core: StateMachineCore<C>,
    queue: EventQueue,
    config: RunnerConfig,
    stop: Arc<AtomicBool>,
    run_id: Uuid,
}

impl<C: Send + Sync + 'static> RootRunner<C> {
    pub fn new(
        definition: Arc<MachineDefinition<C>>,
        context: C,
        config: RunnerConfig,
    ) -> Result<Self, HsmError> {
        Self::with_clock(definition, context, config, Arc::new(SystemClock))
    }

    /// Runner whose conditions measure time on `clock`.
    ///
    /// The loop itself always sleeps on the system clock.
    pub fn with_clock(
        definition: Arc<MachineDefinition<C>>,
        context: C,
        config: RunnerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HsmError> {
        config.validate()?;
        let queue = EventQueue::new();
        let machine = MachineRef::root(
            definition.name(),
            queue.sender(),
            Arc::new(context),
            clock,
            config.history_limit,
        );
        let core = StateMachineCore::new(definition, machine)?;

        Ok(Self {
            core,
            queue,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            run_id: Uuid::new_v4(),
        })
    }

    /// Producer handle onto the root queue.
    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn send(&self, event: Event) {
        self.queue.push(event);
    }

    pub fn core(&self) -> &StateMachineCore<C> {
        &self.core
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Events waiting in the root queue.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Execute one tick, entering the initial state first if needed.
    ///
    /// Returns the completion once the machine has reached FINAL or FAILED.
    /// A terminated machine is not advanced again.
    pub fn tick(&mut self) -> Result<Option<Completion>, HsmError> {
        if !self.core.is_active() {
            self.core.enter()?;
        }
        if let Some(completion) = self.completion() {
            return Ok(Some(completion));
        }

        let event = self.queue.pop();
        trace!(
            tick = self.core.ticks() + 1,
            event = event.as_ref().map(|e| e.tag().as_str()),
            "tick"
        );
        self.core.advance(event.as_ref())?;
        Ok(self.completion())
    }

    /// Run the loop on the calling thread until the machine terminates or a
    /// hook fails.
    pub fn run(mut self) -> Result<RunReport<C>, HsmError> {
        let span = info_span!("hsm", machine = %self.core.name(), run_id = %self.run_id);
        let _guard = span.enter();
        info!(tick_period_ms = self.config.tick_period_ms, "run loop started");

        match self.run_loop() {
            Ok(completion) => {
                info!(?completion, ticks = self.core.ticks(), "run loop terminated");
                Ok(RunReport {
                    run_id: self.run_id,
                    completion,
                    ticks: self.core.ticks(),
                    machine: self.core,
                })
            }
            Err(err) => {
                error!(error = %err, ticks = self.core.ticks(), "run loop aborted");
                Err(err)
            }
        }
    }

    fn run_loop(&mut self) -> Result<Completion, HsmError> {
        let period = self.config.tick_period();
        loop {
            if self.stop.load(Ordering::Acquire) {
                return Ok(Completion::Stopped);
            }

            let started = Instant::now();
            if let Some(completion) = self.tick()? {
                return Ok(completion);
            }

            let elapsed = started.elapsed();
            match period.checked_sub(elapsed) {
                Some(remaining) => thread::sleep(remaining),
                None => debug!(?elapsed, ?period, "tick overran its period"),
            }
        }
    }

    /// Move the loop to a dedicated thread.
    pub fn start(self) -> Result<MachineHandle<C>, HsmError> {
        let name = self
            .config
            .thread_name
            .clone()
            .unwrap_or_else(|| self.core.name().to_string());
        let sender = self.sender();
        let stop = Arc::clone(&self.stop);
        let run_id = self.run_id;

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())?;

        Ok(MachineHandle {
            name,
            run_id,
            sender,
            stop,
            thread,
        })
    }
}

impl<C: 'static> RootRunner<C> {
    /// Ask [`run`](RootRunner::run) to return at the next tick boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    fn completion(&self) -> Option<Completion> {
        if self.core.is_finished() {
            Some(Completion::Finished)
        } else if self.core.is_failed() {
            Some(Completion::Failed)
        } else {
            None
        }
    }
}

impl<C> std::fmt::Debug for RootRunner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootRunner")
            .field("core", &self.core)
            .field("pending", &self.queue.len())
            .field("run_id", &self.run_id)
            .finish()
    }
}
