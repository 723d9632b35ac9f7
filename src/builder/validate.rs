//! Well-formedness checks run by [`MachineBuilder::build`](crate::builder::MachineBuilder::build).
//!
//! Checks accumulate with `Validation` so one build reports every problem.
//! They cover local shape only; completeness and reachability of the table
//! are not verified.

use crate::builder::error::DefinitionError;
use crate::core::Condition;
use crate::machine::{Target, Transition};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

pub(crate) fn validate_definition<C>(
    initial: Option<&Target<C>>,
    transitions: &[Transition<C>],
) -> Check {
    let mut checks: Vec<Check> = Vec::new();

    checks.push(match initial {
        Some(_) => Validation::success(()),
        None => Validation::fail(DefinitionError::MissingInitialState),
    });

    for (index, transition) in transitions.iter().enumerate() {
        checks.push(if transition.from.is_terminal() {
            Validation::fail(DefinitionError::TransitionFromSentinel {
                index,
                from: transition.from.name().to_string(),
            })
        } else {
            Validation::success(())
        });

        if let Condition::Event(tag) = &transition.condition {
            if tag.as_str().is_empty() {
                checks.push(Validation::fail(DefinitionError::EmptyEventTag { index }));
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}
