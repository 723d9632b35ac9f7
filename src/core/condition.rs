//! Transition guards.
//!
//! A [`Condition`] decides, once per tick, whether a transition fires. The set
//! of condition shapes is closed, so evaluation is an exhaustive match; the
//! only runtime failures left are asking a leaf state about child completion
//! and a state-aware predicate meeting a state of another type.

use crate::core::event::{Event, EventTag};
use crate::core::state::State;
use crate::error::HsmError;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type DetachedCheck = Arc<dyn Fn() -> bool + Send + Sync>;
type StateCheck<C> = Arc<dyn Fn(&dyn State<C>) -> Result<bool, HsmError> + Send + Sync>;

/// A named predicate.
pub enum Predicate<C> {
    /// Called with no arguments.
    Detached {
        name: Cow<'static, str>,
        check: DetachedCheck,
    },
    /// Called with the current state instance.
    OnState {
        name: Cow<'static, str>,
        check: StateCheck<C>,
    },
}

impl<C> Predicate<C> {
    pub fn name(&self) -> &str {
        match self {
            Self::Detached { name, .. } | Self::OnState { name, .. } => name,
        }
    }
}

impl<C> Clone for Predicate<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Detached { name, check } => Self::Detached {
                name: name.clone(),
                check: Arc::clone(check),
            },
            Self::OnState { name, check } => Self::OnState {
                name: name.clone(),
                check: Arc::clone(check),
            },
        }
    }
}

/// Inputs a condition is evaluated against.
pub struct Evaluation<'a, C> {
    /// The machine's current state instance
    pub state: &'a dyn State<C>,
    /// Name of the current state's kind
    pub state_name: &'a str,
    /// The event dequeued this tick
    pub event: Option<&'a Event>,
    /// Time since the current state was entered
    pub elapsed: Duration,
}

/// Guard of a transition.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::Condition;
/// use std::time::Duration;
///
/// let guards: Vec<Condition> = vec![
///     Condition::timeout(Duration::from_secs(5)),
///     Condition::event("wah"),
///     Condition::always(),
/// ];
/// assert_eq!(guards[0].label(), "timeout: 5s");
/// assert_eq!(guards[1].label(), "event: wah");
/// ```
pub enum Condition<C = ()> {
    Predicate(Predicate<C>),
    Literal(bool),
    /// Fires once the current state has been active for at least this long.
    Timeout(Duration),
    /// Fires when this tick's event carries this tag.
    Event(EventTag),
    /// Fires when the current state is a nested machine that reached FINAL.
    ChildFinished,
    /// Fires when the current state is a nested machine that reached FAILED.
    ChildFailed,
}

impl<C: 'static> Condition<C> {
    pub fn always() -> Self {
        Self::Literal(true)
    }

    pub fn never() -> Self {
        Self::Literal(false)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout(after)
    }

    pub fn event(tag: impl Into<EventTag>) -> Self {
        Self::Event(tag.into())
    }

    /// Predicate taking no arguments.
    pub fn when<F>(name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Predicate::Detached {
            name: name.into(),
            check: Arc::new(check),
        })
    }

    /// Predicate reading the current state instance, which must be an `S`.
    pub fn when_state<S, F>(name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        S: State<C>,
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let label = name.clone();
        let check: StateCheck<C> = Arc::new(move |state: &dyn State<C>| {
            state
                .downcast_ref::<S>()
                .map(&check)
                .ok_or_else(|| HsmError::StateMismatch {
                    condition: label.to_string(),
                    expected: std::any::type_name::<S>().to_string(),
                    found: "another state type".to_string(),
                })
        });
        Self::Predicate(Predicate::OnState { name, check })
    }

    /// Evaluate against the current state and this tick's event.
    pub fn evaluate(&self, eval: &Evaluation<'_, C>) -> Result<bool, HsmError> {
        match self {
            Self::Predicate(Predicate::Detached { check, .. }) => Ok(check()),
            Self::Predicate(Predicate::OnState { check, .. }) => {
                check(eval.state).map_err(|err| match err {
                    HsmError::StateMismatch {
                        condition,
                        expected,
                        ..
                    } => HsmError::StateMismatch {
                        condition,
                        expected,
                        found: eval.state_name.to_string(),
                    },
                    other => other,
                })
            }
            Self::Literal(value) => Ok(*value),
            Self::Timeout(after) => Ok(eval.elapsed >= *after),
            Self::Event(tag) => Ok(eval.event.is_some_and(|event| event.is(tag))),
            Self::ChildFinished => self.child(eval).map(|m| m.is_finished()),
            Self::ChildFailed => self.child(eval).map(|m| m.is_failed()),
        }
    }

    fn child<'a>(
        &self,
        eval: &Evaluation<'a, C>,
    ) -> Result<&'a crate::machine::StateMachineCore<C>, HsmError> {
        eval.state.as_machine().ok_or_else(|| HsmError::NotAMachine {
            condition: self.label(),
            state: eval.state_name.to_string(),
        })
    }
}

impl<C> Condition<C> {
    /// Human-readable rendering used in logs and graph labels.
    pub fn label(&self) -> String {
        match self {
            Self::Predicate(p) => p.name().to_string(),
            Self::Literal(value) => value.to_string(),
            Self::Timeout(after) => format!("timeout: {}", format_duration(*after)),
            Self::Event(tag) => format!("event: {tag}"),
            Self::ChildFinished => "child finished".to_string(),
            Self::ChildFailed => "child failed".to_string(),
        }
    }
}

impl<C> Clone for Condition<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Predicate(p) => Self::Predicate(p.clone()),
            Self::Literal(value) => Self::Literal(*value),
            Self::Timeout(after) => Self::Timeout(*after),
            Self::Event(tag) => Self::Event(tag.clone()),
            Self::ChildFinished => Self::ChildFinished,
            Self::ChildFailed => Self::ChildFailed,
        }
    }
}

impl<C> fmt::Debug for Condition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self.label())
    }
}

fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else if d < Duration::from_secs(1) && d.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}s", d.as_secs_f64())
    }
}
