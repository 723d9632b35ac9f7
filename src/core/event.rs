//! Events delivered to machines.
//!
//! An event is an immutable envelope: a tag that transitions match on and an
//! opaque JSON payload that only state logic interprets.

use crate::error::HsmError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Discriminating tag of an [`Event`].
///
/// Event-type conditions compare tags only; payloads never take part in
/// transition matching.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTag(Cow<'static, str>);

impl EventTag {
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EventTag {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for EventTag {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

/// Immutable event envelope.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::Event;
///
/// let event = Event::with_payload("obstacle", 0.42_f64).unwrap();
/// assert_eq!(event.tag().as_str(), "obstacle");
/// assert_eq!(event.payload_as::<f64>().unwrap(), 0.42);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    tag: EventTag,
    #[serde(default)]
    payload: Value,
}

impl Event {
    /// Event with a null payload.
    pub fn new(tag: impl Into<EventTag>) -> Self {
        Self {
            tag: tag.into(),
            payload: Value::Null,
        }
    }

    /// Event carrying a serialized payload.
    pub fn with_payload<T: Serialize>(tag: impl Into<EventTag>, payload: T) -> Result<Self, HsmError> {
        let tag = tag.into();
        let payload = serde_json::to_value(payload).map_err(|source| HsmError::InvalidPayload {
            tag: tag.to_string(),
            source,
        })?;
        Ok(Self { tag, payload })
    }

    pub fn tag(&self) -> &EventTag {
        &self.tag
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Decode the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, HsmError> {
        T::deserialize(&self.payload).map_err(|source| HsmError::InvalidPayload {
            tag: self.tag.to_string(),
            source,
        })
    }

    /// True if this event carries the given tag.
    pub fn is(&self, tag: &EventTag) -> bool {
        self.tag == *tag
    }
}
