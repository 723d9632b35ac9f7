//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders, shorthand transition constructors,
//! and the [`leaf_state!`](crate::leaf_state) macro.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;
mod validate;

pub use error::{BuildError, DefinitionError, DefinitionErrors};
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::{Condition, Construct, EventTag, Params, State, StateKind};
use crate::machine::{Target, Transition};
use std::time::Duration;

/// Transition from `A` to `B` guarded by an arbitrary condition.
pub fn guarded_transition<A, B, C>(condition: Condition<C>) -> Transition<C>
where
    A: State<C>,
    B: Construct<C>,
    C: Send + Sync + 'static,
{
    Transition {
        from: StateKind::of::<A>(),
        to: Target::state::<B>(),
        condition,
        params: Params::new(),
    }
}

/// Transition from `A` to `B` once `A` has been active for `after`.
pub fn timeout_transition<A, B, C>(after: Duration) -> Transition<C>
where
    A: State<C>,
    B: Construct<C>,
    C: Send + Sync + 'static,
{
    guarded_transition::<A, B, C>(Condition::timeout(after))
}

/// Transition from `A` to `B` when an event with `tag` is dequeued.
pub fn event_transition<A, B, C>(tag: impl Into<EventTag>) -> Transition<C>
where
    A: State<C>,
    B: Construct<C>,
    C: Send + Sync + 'static,
{
    guarded_transition::<A, B, C>(Condition::event(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, Evaluation};

    #[derive(Default)]
    struct Start;
    #[derive(Default)]
    struct Middle;

    impl State for Start {}
    impl State for Middle {}

    crate::leaf_state!(Start, Middle);

    #[test]
    fn timeout_transition_builds() {
        let transition = timeout_transition::<Start, Middle, ()>(Duration::from_secs(5));

        assert_eq!(transition.from, StateKind::of::<Start>());
        assert_eq!(transition.to.kind(), StateKind::of::<Middle>());
        assert_eq!(transition.condition.label(), "timeout: 5s");
    }

    #[test]
    fn event_transition_matches_its_tag() {
        let transition = event_transition::<Start, Middle, ()>("wah");
        let state = Start;
        let wah = Event::new("wah");
        let eval = Evaluation {
            state: &state as &dyn State,
            state_name: "Start",
            event: Some(&wah),
            elapsed: Duration::ZERO,
        };

        assert!(transition.condition.evaluate(&eval).unwrap());
    }
}
