//! Context views handed to guards, actions, and `with_context` callers.
//!
//! A context exists only while the exclusive state lock is held. It owns
//! nothing: reads and writes go straight to the engine's guarded data, and
//! fired events go through the engine's queue lock.

use crate::core::{Event, Key, State};
use crate::logging::InstanceId;
use crate::machine::engine::{Guarded, PendingEvent, Shared};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Locked view of a machine's state, property bag, and event queue.
///
/// Guards see `&FsmContext` and can only read. Actions and `with_context`
/// callers see it mutably and may fire events, shelve events, and update
/// the property bag.
///
/// Do not call back into the owning [`StrictMachine`](crate::StrictMachine)
/// (`state()`, `with_context`, `fire_event_blocking`) while holding a
/// context: the exclusive lock is already held and is not reentrant.
pub struct FsmContext<'a, S, E> {
    engine: &'a Arc<Shared<S, E>>,
    guarded: &'a mut Guarded<S, E>,
}

impl<'a, S: State, E: Event> FsmContext<'a, S, E> {
    pub(crate) fn new(engine: &'a Arc<Shared<S, E>>, guarded: &'a mut Guarded<S, E>) -> Self {
        Self { engine, guarded }
    }

    /// The machine's current state.
    pub fn current_state(&self) -> &S {
        &self.guarded.state
    }

    /// Identifier of the owning machine.
    pub fn instance_id(&self) -> InstanceId {
        self.engine.instance_id()
    }

    /// Queue `event` for evaluation after the current cycle.
    ///
    /// Never waits on the state lock; the event joins the back of the live
    /// queue.
    pub fn fire_event(&mut self, event: E) {
        self.engine.enqueue(PendingEvent::new(event, None));
    }

    /// Hold `event` on the shelf until [`process_shelved_events`] is called.
    ///
    /// [`process_shelved_events`]: FsmContext::process_shelved_events
    pub fn shelve_event(&mut self, event: E) {
        self.guarded.shelf.push_back(event);
    }

    /// Move every shelved event to the front of the live queue, keeping
    /// their relative order, so they are evaluated before anything queued
    /// in the meantime.
    pub fn process_shelved_events(&mut self) {
        let shelved = std::mem::take(&mut self.guarded.shelf);
        self.engine.requeue_front(shelved);
    }

    /// Number of events currently shelved.
    pub fn shelved_events(&self) -> usize {
        self.guarded.shelf.len()
    }

    /// Value stored under `key`, if any.
    pub fn get<T: Send + Sync + 'static>(&self, key: &Key<T>) -> Option<&T> {
        self.guarded
            .values
            .get(&key.slot())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Mutable access to the value stored under `key`, if any.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self, key: &Key<T>) -> Option<&mut T> {
        self.guarded
            .values
            .get_mut(&key.slot())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &Key<T>, value: T) -> Option<T> {
        self.guarded
            .values
            .insert(key.slot(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    /// Remove and return the value stored under `key`.
    pub fn remove<T: Send + Sync + 'static>(&mut self, key: &Key<T>) -> Option<T> {
        self.guarded
            .values
            .remove(&key.slot())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains_key<T: Send + Sync + 'static>(&self, key: &Key<T>) -> bool {
        self.guarded.values.contains_key(&key.slot())
    }
}

/// Context passed to actions: an [`FsmContext`] plus the transition that
/// was just committed.
pub struct ActionContext<'a, S, E> {
    inner: FsmContext<'a, S, E>,
    from: &'a S,
    to: &'a S,
    event: &'a E,
}

impl<'a, S: State, E: Event> ActionContext<'a, S, E> {
    pub(crate) fn new(inner: FsmContext<'a, S, E>, from: &'a S, to: &'a S, event: &'a E) -> Self {
        Self {
            inner,
            from,
            to,
            event,
        }
    }

    /// State transitioned from.
    pub fn from(&self) -> &S {
        self.from
    }

    /// State transitioned to.
    pub fn to(&self) -> &S {
        self.to
    }

    /// Event that caused the transition.
    pub fn event(&self) -> &E {
        self.event
    }
}

impl<'a, S, E> Deref for ActionContext<'a, S, E> {
    type Target = FsmContext<'a, S, E>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'a, S, E> DerefMut for ActionContext<'a, S, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::FsmContext;
    use crate::core::{Event, State};
    use crate::executor::{Executor, Task};
    use crate::machine::StrictMachine;
    use std::sync::Arc;

    struct DiscardingExecutor;

    impl Executor for DiscardingExecutor {
        fn execute(&self, task: Task) {
            drop(task);
        }
    }

    /// Run `f` against the context of a machine with no rules whose
    /// evaluation units are never run.
    pub(crate) fn with_detached_context<S, E, R>(
        state: S,
        f: impl FnOnce(&mut FsmContext<'_, S, E>) -> R,
    ) -> R
    where
        S: State,
        E: Event,
    {
        let machine: StrictMachine<S, E> = StrictMachine::new(
            state,
            Vec::new(),
            Vec::new(),
            Arc::new(DiscardingExecutor),
            None,
        );
        machine.get_from_context(f)
    }
}
