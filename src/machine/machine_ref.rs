//! Back-reference from a state to the machine that owns it.

use crate::core::{Clock, Event, SystemClock, DEFAULT_HISTORY_LIMIT};
use crate::machine::queue::{EventQueue, EventSender};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Non-owning handle a state receives at construction.
///
/// It exposes the machine's path, the shared context, the clock, and a way
/// to post events to the hierarchy's queue. It gives no access to the
/// machine's current state or transition table.
///
/// # Example
///
/// ```rust
/// use hsm_engine::machine::MachineRef;
///
/// struct Robot {
///     max_speed: f64,
/// }
///
/// let machine = MachineRef::detached("Patrol", Robot { max_speed: 1.2 });
/// assert_eq!(machine.path(), "Patrol");
/// assert_eq!(machine.context().max_speed, 1.2);
/// ```
pub struct MachineRef<C = ()> {
    path: Arc<str>,
    sender: EventSender,
    context: Arc<C>,
    clock: Arc<dyn Clock>,
    pub(crate) history_limit: usize,
}

impl<C> MachineRef<C> {
    pub(crate) fn root(
        name: &str,
        sender: EventSender,
        context: Arc<C>,
        clock: Arc<dyn Clock>,
        history_limit: usize,
    ) -> Self {
        Self {
            path: Arc::from(name),
            sender,
            context,
            clock,
            history_limit,
        }
    }

    /// Handle that is not attached to a running hierarchy.
    ///
    /// Events sent through it go to a private queue nobody drains. Useful for
    /// driving a [`StateMachineCore`](crate::machine::StateMachineCore) by
    /// hand and for unit-testing states.
    pub fn detached(name: &str, context: C) -> Self {
        Self::root(
            name,
            EventQueue::new().sender(),
            Arc::new(context),
            Arc::new(SystemClock),
            DEFAULT_HISTORY_LIMIT,
        )
    }

    /// Replace the clock, e.g. with a [`ManualClock`](crate::core::ManualClock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn child(&self, name: &str) -> Self {
        Self {
            path: Arc::from(format!("{}/{}", self.path, name)),
            sender: self.sender.clone(),
            context: Arc::clone(&self.context),
            clock: Arc::clone(&self.clock),
            history_limit: self.history_limit,
        }
    }

    /// Slash-separated names from the root machine down to this one.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Post an event to the hierarchy's queue.
    pub fn send(&self, event: Event) {
        self.sender.send(event);
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn shared_context(&self) -> Arc<C> {
        Arc::clone(&self.context)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl<C> Clone for MachineRef<C> {
    fn clone(&self) -> Self {
        Self {
            path: Arc::clone(&self.path),
            sender: self.sender.clone(),
            context: Arc::clone(&self.context),
            clock: Arc::clone(&self.clock),
            history_limit: self.history_limit,
        }
    }
}

impl<C> fmt::Debug for MachineRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineRef").field("path", &self.path).finish()
    }
}
