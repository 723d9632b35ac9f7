//! Transitions and their targets.

use crate::core::{Condition, Construct, Failed, Final, Params, State, StateKind};
use crate::error::HsmError;
use crate::machine::definition::MachineDefinition;
use crate::machine::machine_ref::MachineRef;
use crate::machine::state_machine::StateMachineCore;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A target whose parameters are already decoded; constructing it cannot fail.
pub(crate) type Prepared<C> = Box<dyn FnOnce(&MachineRef<C>) -> Box<dyn State<C>>>;

type PrepareFn<C> =
    Arc<dyn Fn(&MachineRef<C>, Map<String, Value>) -> Result<Prepared<C>, HsmError> + Send + Sync>;

/// What a transition constructs when it fires.
///
/// Building happens in two steps: the parameters are decoded first, which
/// may fail, and the state is constructed afterwards, which cannot. A machine
/// decodes before exiting the outgoing state, so bad parameters leave the
/// current state untouched.
pub struct Target<C = ()> {
    kind: StateKind,
    nested: Option<Arc<MachineDefinition<C>>>,
    prepare: PrepareFn<C>,
}

impl<C: Send + Sync + 'static> Target<C> {
    /// A state type built from its typed configuration.
    pub fn state<S: Construct<C>>() -> Self {
        let kind = StateKind::of::<S>();
        let prepare: PrepareFn<C> = Arc::new(move |_machine, params| {
            let config: S::Config = if params.is_empty() {
                S::Config::default()
            } else {
                serde_json::from_value(Value::Object(params)).map_err(|source| {
                    HsmError::InvalidParams {
                        state: kind.name().to_string(),
                        source,
                    }
                })?
            };
            let construct: Prepared<C> =
                Box::new(move |machine| Box::new(S::construct(machine, config)) as Box<dyn State<C>>);
            Ok(construct)
        });
        Self {
            kind,
            nested: None,
            prepare,
        }
    }

    /// A nested machine, entered at its initial state.
    ///
    /// Parameters handed to this target are forwarded to the nested
    /// machine's initial state.
    pub fn machine(definition: Arc<MachineDefinition<C>>) -> Self {
        let nested = Arc::clone(&definition);
        let prepare: PrepareFn<C> = Arc::new(move |parent, params| {
            let core = StateMachineCore::prepare_nested(Arc::clone(&nested), parent, params)?;
            let construct: Prepared<C> = Box::new(move |_parent| Box::new(core()) as Box<dyn State<C>>);
            Ok(construct)
        });
        Self {
            kind: definition.kind(),
            nested: Some(definition),
            prepare,
        }
    }

    pub fn finished() -> Self {
        Self::state::<Final>()
    }

    pub fn failed() -> Self {
        Self::state::<Failed>()
    }
}

impl<C> Target<C> {
    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Definition of the nested machine, if this target is one.
    pub fn nested_definition(&self) -> Option<&Arc<MachineDefinition<C>>> {
        self.nested.as_ref()
    }

    /// Decode `params` for this target without constructing anything.
    pub(crate) fn prepare(
        &self,
        machine: &MachineRef<C>,
        params: Map<String, Value>,
    ) -> Result<Prepared<C>, HsmError> {
        (self.prepare)(machine, params)
    }
}

impl<C> Clone for Target<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            nested: self.nested.clone(),
            prepare: Arc::clone(&self.prepare),
        }
    }
}

impl<C> fmt::Debug for Target<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind)
            .field("nested", &self.nested.is_some())
            .finish()
    }
}

/// A guarded edge from one state kind to a target.
///
/// Transitions are immutable once a machine definition is built. Several may
/// leave the same kind; they are tried in declaration order and the first
/// whose condition holds fires.
pub struct Transition<C = ()> {
    pub from: StateKind,
    pub to: Target<C>,
    pub condition: Condition<C>,
    pub params: Params<C>,
}

impl<C> Transition<C> {
    /// `from -> to [label]`, for logs.
    pub fn describe(&self) -> String {
        format!(
            "{} -> {} [{}]",
            self.from,
            self.to.kind(),
            self.condition.label()
        )
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            from: self.from,
            to: self.to.clone(),
            condition: self.condition.clone(),
            params: self.params.clone(),
        }
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to.kind())
            .field("condition", &self.condition)
            .field("params", &self.params)
            .finish()
    }
}
