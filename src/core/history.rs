//! State transition history tracking.
//!
//! Every state change a machine performs is appended to its history, so the
//! sequence of states a run went through can be inspected afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records a history keeps.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     machine: "Patrol".to_string(),
///     from: "Idle".to_string(),
///     to: "Cruise".to_string(),
///     tick: 3,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to, "Cruise");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Path of the machine that changed state
    pub machine: String,
    /// The state being left
    pub from: String,
    /// The state being entered
    pub to: String,
    /// Tick of the owning machine on which the change happened
    pub tick: u64,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of state changes.
///
/// Once `limit` records are held, recording a new one drops the oldest.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(8);
/// for (from, to) in [("A", "B"), ("B", "Final")] {
///     history.record(TransitionRecord {
///         machine: "M".to_string(),
///         from: from.to_string(),
///         to: to.to_string(),
///         tick: 0,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.get_path(), vec!["A", "B", "Final"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
    dropped: u64,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHistory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// History keeping at most `limit` records (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: limit.max(1),
            dropped: 0,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.records.len() == self.limit {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    /// Names of the states traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Time between the first and the last retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> impl ExactSizeIterator<Item = &TransitionRecord> + '_ {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records evicted because of the limit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
