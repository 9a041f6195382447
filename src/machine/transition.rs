//! Transition rules.

use crate::core::{Event, Guard, Predicate, State};
use crate::machine::context::FsmContext;

/// A rule that moves the machine to `target()` when it matches.
///
/// Rules are tried in registration order and the first match wins; when
/// none matches the state is left unchanged.
pub trait Transition<S, E>: Send + Sync {
    /// State adopted when this rule fires.
    fn target(&self) -> &S;

    /// Whether this rule applies to `state` and `event`.
    ///
    /// Runs under the exclusive lock; must be pure and fast.
    fn matches(&self, ctx: &FsmContext<'_, S, E>, state: &S, event: &E) -> bool;
}

/// Transition built from a source predicate, an event predicate, and a guard.
pub struct PredicatedTransition<S, E> {
    from: Predicate<S>,
    via: Predicate<E>,
    guard: Guard<S, E>,
    target: S,
}

impl<S: State, E: Event> PredicatedTransition<S, E> {
    /// Create an unguarded transition.
    pub fn new(from: Predicate<S>, via: Predicate<E>, target: S) -> Self {
        Self {
            from,
            via,
            guard: Guard::always(),
            target,
        }
    }

    pub fn with_guard(mut self, guard: Guard<S, E>) -> Self {
        self.guard = guard;
        self
    }

    pub(crate) fn set_guard(&mut self, guard: Guard<S, E>) {
        self.guard = guard;
    }

    pub fn from(&self) -> &Predicate<S> {
        &self.from
    }

    pub fn via(&self) -> &Predicate<E> {
        &self.via
    }

    pub fn guard(&self) -> &Guard<S, E> {
        &self.guard
    }
}

impl<S: State, E: Event> Transition<S, E> for PredicatedTransition<S, E> {
    fn target(&self) -> &S {
        &self.target
    }

    fn matches(&self, ctx: &FsmContext<'_, S, E>, state: &S, event: &E) -> bool {
        // Guard last: it is the only part that may look at the context.
        self.from.test(state) && self.via.test(event) && self.guard.check(ctx)
    }
}
