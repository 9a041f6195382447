//! `when(..).on(..).transition_to(..)` chain.

use crate::builder::action::ActionBuilder;
use crate::builder::machine::{FsmBuilder, TransitionEntry};
use crate::core::{Event, Guard, Predicate, State};
use crate::machine::{ActionContext, FsmContext, PredicatedTransition};
use std::fmt::Display;

/// Selects the event of a transition whose source is already chosen.
pub struct TransitionBuilder<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    from: Predicate<S>,
}

impl<'a, S: State, E: Event> TransitionBuilder<'a, S, E> {
    pub(super) fn new(builder: &'a mut FsmBuilder<S, E>, from: Predicate<S>) -> Self {
        Self { builder, from }
    }

    /// Fire on events equal to `event`.
    pub fn on(self, event: E) -> TransitionTo<'a, S, E>
    where
        E: PartialEq,
    {
        self.on_match(Predicate::eq(event))
    }

    /// Fire on any event of the same enum variant as `sample`, whatever its
    /// payload.
    pub fn on_variant(self, sample: &E) -> TransitionTo<'a, S, E> {
        self.on_match(Predicate::variant(sample))
    }

    /// Fire on events accepted by `filter`.
    pub fn on_match(self, filter: Predicate<E>) -> TransitionTo<'a, S, E> {
        TransitionTo {
            builder: self.builder,
            from: self.from,
            via: filter,
        }
    }

    /// Fire on every event.
    pub fn on_any(self) -> TransitionTo<'a, S, E> {
        self.on_match(Predicate::any())
    }
}

/// Selects the target of a transition.
pub struct TransitionTo<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    from: Predicate<S>,
    via: Predicate<E>,
}

impl<'a, S: State, E: Event> TransitionTo<'a, S, E> {
    /// Register the transition. It is active immediately, unguarded.
    pub fn transition_to(self, target: S) -> GuardBuilder<'a, S, E> {
        let transition =
            PredicatedTransition::new(self.from.clone(), self.via.clone(), target.clone());
        self.builder
            .transitions
            .push(TransitionEntry::Predicated(transition));
        let index = self.builder.transitions.len() - 1;

        GuardBuilder {
            builder: self.builder,
            index,
            from: self.from,
            via: self.via,
            target,
        }
    }
}

/// Optionally guards the transition just registered, or attaches actions
/// to it.
///
/// Actions attached here match `from -> target` via the same event filter,
/// whether or not the guard let the transition fire.
pub struct GuardBuilder<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    index: usize,
    from: Predicate<S>,
    via: Predicate<E>,
    target: S,
}

impl<'a, S: State, E: Event> GuardBuilder<'a, S, E> {
    /// Only take the transition while `guard` holds.
    pub fn guarded_by<F>(self, guard: F) -> ActionBuilder<'a, S, E>
    where
        F: Fn(&FsmContext<'_, S, E>) -> bool + Send + Sync + 'static,
    {
        if let Some(TransitionEntry::Predicated(transition)) =
            self.builder.transitions.get_mut(self.index)
        {
            transition.set_guard(Guard::new(guard));
        }
        self.into_actions()
    }

    pub fn execute<F>(self, action: F) -> ActionBuilder<'a, S, E>
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        self.into_actions().execute(action)
    }

    pub fn execute_last<F>(self, action: F) -> ActionBuilder<'a, S, E>
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        self.into_actions().execute_last(action)
    }

    pub fn execute_first<F>(self, action: F) -> ActionBuilder<'a, S, E>
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        self.into_actions().execute_first(action)
    }

    pub fn try_execute<F, Er>(self, action: F) -> ActionBuilder<'a, S, E>
    where
        F: Fn(&mut ActionContext<'_, S, E>) -> Result<(), Er> + Send + Sync + 'static,
        Er: Display,
    {
        self.into_actions().try_execute(action)
    }

    fn into_actions(self) -> ActionBuilder<'a, S, E> {
        ActionBuilder::new(
            self.builder,
            self.from,
            Predicate::eq(self.target),
            self.via,
        )
    }
}
