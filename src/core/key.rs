//! Typed keys for the context property bag.

use crate::core::state::{Event, State};
use crate::machine::FsmContext;
use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Identifies a slot in the context property bag that holds a `T`.
///
/// Keys compare by name *and* value type: `Key::<u32>::new("count")` and
/// `Key::<String>::new("count")` address two different slots, so a lookup can
/// never observe a value of the wrong type.
///
/// # Example
///
/// ```rust
/// use strictmachine::core::Key;
///
/// const RETRIES: Key<u32> = Key::new("retries");
/// assert_eq!(RETRIES.name(), "retries");
/// ```
pub struct Key<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Create a key with a static name. Usable in `const` items.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// Create a key with a name computed at runtime.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Send + Sync + 'static> Key<T> {
    /// Shorthand for [`FsmContext::get`].
    pub fn get<'c, S: State, E: Event>(&self, ctx: &'c FsmContext<'_, S, E>) -> Option<&'c T> {
        ctx.get(self)
    }

    /// Shorthand for [`FsmContext::set`].
    pub fn set<S: State, E: Event>(&self, ctx: &mut FsmContext<'_, S, E>, value: T) -> Option<T> {
        ctx.set(self, value)
    }

    /// Shorthand for [`FsmContext::remove`].
    pub fn remove<S: State, E: Event>(&self, ctx: &mut FsmContext<'_, S, E>) -> Option<T> {
        ctx.remove(self)
    }
}

impl<T: 'static> Key<T> {
    pub(crate) fn slot(&self) -> Slot {
        Slot {
            name: self.name.clone(),
            type_id: TypeId::of::<T>(),
        }
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("type", &type_name::<T>())
            .finish()
    }
}

/// Erased `(name, type)` pair used as the property bag's map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Slot {
    name: Cow<'static, str>,
    type_id: TypeId,
}
