//! Construction parameters declared on transitions.
//!
//! A transition may hand its target state named values. Each value is either
//! a literal or a factory that is invoked once, when the target is built; the
//! resolved values are then decoded into the target's typed
//! [`Construct::Config`](crate::core::Construct::Config).

use crate::machine::MachineRef;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

type DetachedFn = Arc<dyn Fn() -> Value + Send + Sync>;
type WithMachineFn<C> = Arc<dyn Fn(&MachineRef<C>) -> Value + Send + Sync>;

/// A value computed at construction time.
pub enum Factory<C> {
    /// Needs nothing from the owning machine.
    Detached(DetachedFn),
    /// Reads the owning machine's shared context.
    WithMachine(WithMachineFn<C>),
}

impl<C> Factory<C> {
    fn produce(&self, machine: &MachineRef<C>) -> Value {
        match self {
            Self::Detached(f) => f(),
            Self::WithMachine(f) => f(machine),
        }
    }
}

impl<C> Clone for Factory<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Detached(f) => Self::Detached(Arc::clone(f)),
            Self::WithMachine(f) => Self::WithMachine(Arc::clone(f)),
        }
    }
}

/// A declared parameter value.
pub enum ParamValue<C> {
    Literal(Value),
    Factory(Factory<C>),
}

impl<C> Clone for ParamValue<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(v) => Self::Literal(v.clone()),
            Self::Factory(f) => Self::Factory(f.clone()),
        }
    }
}

impl<C> fmt::Debug for ParamValue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "Literal({v})"),
            Self::Factory(Factory::Detached(_)) => f.write_str("Factory(detached)"),
            Self::Factory(Factory::WithMachine(_)) => f.write_str("Factory(with machine)"),
        }
    }
}

/// Ordered set of named construction parameters.
///
/// Setting a name twice keeps the position of the first and the value of the
/// last.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::Params;
///
/// let params: Params = Params::new()
///     .literal("speed", 0.5)
///     .computed("started", || "now");
/// assert_eq!(params.len(), 2);
/// ```
pub struct Params<C = ()> {
    entries: Vec<(String, ParamValue<C>)>,
}

impl<C> Params<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn set(mut self, name: impl Into<String>, value: ParamValue<C>) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn literal(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, ParamValue::Literal(value.into()))
    }

    /// Value produced by a context-free factory at construction time.
    pub fn computed<F, V>(self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        let factory: DetachedFn = Arc::new(move || factory().into());
        self.set(name, ParamValue::Factory(Factory::Detached(factory)))
    }

    /// Value produced from the owning machine at construction time.
    pub fn computed_with<F, V>(self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&MachineRef<C>) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        let factory: WithMachineFn<C> = Arc::new(move |machine| factory(machine).into());
        self.set(name, ParamValue::Factory(Factory::WithMachine(factory)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Invoke every factory once and collect the results.
    pub fn resolve(&self, machine: &MachineRef<C>) -> Map<String, Value> {
        let mut resolved = Map::new();
        self.resolve_onto(machine, &mut resolved);
        resolved
    }

    /// Resolve into `target`, overwriting entries with the same name.
    pub fn resolve_onto(&self, machine: &MachineRef<C>, target: &mut Map<String, Value>) {
        for (name, value) in &self.entries {
            let value = match value {
                ParamValue::Literal(v) => v.clone(),
                ParamValue::Factory(factory) => factory.produce(machine),
            };
            target.insert(name.clone(), value);
        }
    }
}

impl<C> Default for Params<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Params<C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C> fmt::Debug for Params<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
