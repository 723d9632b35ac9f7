//! The State contract, state kinds, and the two sentinel states.
//!
//! A state kind is the key a machine's transition table is indexed by; a state
//! instance is the live object for that kind. Instances are built by the
//! machine when a transition selects them and dropped when replaced.

use crate::core::event::Event;
use crate::error::HsmError;
use crate::machine::{MachineRef, StateMachineCore};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of a state hook.
pub type StateResult = Result<(), HsmError>;

/// Object-safe access to the concrete state type behind `dyn State`.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A unit of behaviour driven by a machine.
///
/// Lifecycle: [`enter`](State::enter) once right after construction,
/// [`step`](State::step) once per tick while current, and
/// [`exit`](State::exit) once right before the state is replaced.
/// `C` is the context shared by every state of a machine hierarchy.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{Event, State, StateResult};
///
/// #[derive(Default)]
/// struct Blink {
///     on: bool,
/// }
///
/// impl State for Blink {
///     fn step(&mut self, _event: Option<&Event>) -> StateResult {
///         self.on = !self.on;
///         Ok(())
///     }
/// }
/// ```
pub trait State<C = ()>: AsAny + Send + 'static {
    fn enter(&mut self) -> StateResult {
        Ok(())
    }

    /// Called once per tick with the event dequeued for that tick, if any.
    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        Ok(())
    }

    fn exit(&mut self) -> StateResult {
        Ok(())
    }

    /// The nested machine behind this state, if it is one.
    fn as_machine(&self) -> Option<&StateMachineCore<C>> {
        None
    }
}

impl<C: 'static> dyn State<C> {
    /// Downcast to a concrete state type.
    pub fn downcast_ref<T: State<C>>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A state type that a machine can build as a transition target.
///
/// `Config` is the typed form of the construction parameters a transition
/// declares. When a transition declares none, `Config::default()` is used.
pub trait Construct<C = ()>: State<C> + Sized {
    type Config: DeserializeOwned + Default + 'static;

    fn construct(machine: &MachineRef<C>, config: Self::Config) -> Self;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum KindId {
    Type(TypeId),
    Machine(u64),
}

static NEXT_MACHINE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a state kind, used as the transition-table key.
///
/// Equality and hashing consider identity only; the name is for display.
#[derive(Clone, Copy, Debug)]
pub struct StateKind {
    id: KindId,
    name: &'static str,
}

impl StateKind {
    /// Kind of a Rust state type.
    pub fn of<T: Any>() -> Self {
        Self {
            id: KindId::Type(TypeId::of::<T>()),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// A fresh nested-machine kind, distinct from every other one even when
    /// the names match.
    pub fn machine(name: &'static str) -> Self {
        Self {
            id: KindId::Machine(NEXT_MACHINE_ID.fetch_add(1, Ordering::Relaxed)),
            name,
        }
    }

    pub fn final_state() -> Self {
        Self::of::<Final>()
    }

    pub fn failed_state() -> Self {
        Self::of::<Failed>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_machine(&self) -> bool {
        matches!(self.id, KindId::Machine(_))
    }

    pub fn is_final(&self) -> bool {
        *self == Self::final_state()
    }

    pub fn is_failed(&self) -> bool {
        *self == Self::failed_state()
    }

    /// FINAL or FAILED.
    pub fn is_terminal(&self) -> bool {
        self.is_final() || self.is_failed()
    }
}

impl PartialEq for StateKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StateKind {}

impl Hash for StateKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// `a::b::Thing<x::Y>` -> `Thing`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Successful termination marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Final;

/// Abnormal termination marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Failed;

impl<C: 'static> State<C> for Final {
    fn enter(&mut self) -> StateResult {
        tracing::debug!("entered FINAL");
        Ok(())
    }
}

impl<C: 'static> Construct<C> for Final {
    type Config = ();

    fn construct(_machine: &MachineRef<C>, _config: ()) -> Self {
        Final
    }
}

impl<C: 'static> State<C> for Failed {
    fn enter(&mut self) -> StateResult {
        tracing::debug!("entered FAILED");
        Ok(())
    }
}

impl<C: 'static> Construct<C> for Failed {
    type Config = ();

    fn construct(_machine: &MachineRef<C>, _config: ()) -> Self {
        Failed
    }
}
