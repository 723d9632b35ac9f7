//! The event queue, the only structure shared across threads.
//!
//! Producers push through cloneable [`EventSender`]s from any thread; the
//! owning run loop pops at most one event per tick. The queue is unbounded
//! and never drops events.

use crate::core::Event;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Shared = Arc<Mutex<VecDeque<Event>>>;

/// Consumer side of a machine's FIFO event queue.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: Shared,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Enqueue from the consumer side.
    pub fn push(&self, event: Event) {
        self.inner.lock().push_back(event);
    }

    /// Oldest pending event, without blocking.
    pub fn pop(&self) -> Option<Event> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Producer handle; cheap to clone and safe to use from any thread.
#[derive(Clone, Debug)]
pub struct EventSender {
    inner: Shared,
}

impl EventSender {
    /// Enqueue an event. Never blocks on the consumer.
    pub fn send(&self, event: Event) {
        self.inner.lock().push_back(event);
    }

    /// Number of events not yet consumed.
    pub fn pending(&self) -> usize {
        self.inner.lock().len()
    }
}
