//! Run loop configuration.

use crate::core::DEFAULT_HISTORY_LIMIT;
use crate::error::HsmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default tick period in milliseconds.
pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;

/// Settings for a [`RootRunner`](crate::runner::RootRunner).
///
/// Missing fields take their defaults when deserializing.
///
/// # Example
///
/// ```rust
/// use hsm_engine::runner::RunnerConfig;
/// use std::time::Duration;
///
/// let config = RunnerConfig::from_json_str(r#"{ "tick_period_ms": 20 }"#).unwrap();
/// assert_eq!(config.tick_period(), Duration::from_millis(20));
/// assert_eq!(config.history_limit, 256);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Period of the run loop; each tick sleeps whatever remains of it
    pub tick_period_ms: u64,
    /// Name of the run loop thread; defaults to the machine name
    pub thread_name: Option<String>,
    /// Transition records kept per machine
    pub history_limit: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            thread_name: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, HsmError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| HsmError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HsmError> {
        if self.tick_period_ms == 0 {
            return Err(HsmError::InvalidConfig(
                "tick_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(HsmError::InvalidConfig(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Sub-millisecond parts are truncated.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}
