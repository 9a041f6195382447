//! Predicates over states and events, and guards over the machine context.
//!
//! Both are plain shareable closures. They are evaluated on the dispatch
//! worker while the exclusive state lock is held, so they must be pure and
//! fast.

use crate::core::state::{Event, State};
use crate::machine::FsmContext;
use std::fmt;
use std::mem::{self, Discriminant};
use std::sync::Arc;

/// Shareable boolean test over a value.
///
/// Transitions use a `Predicate<S>` to select the source state and a
/// `Predicate<E>` to select the triggering event; actions additionally use
/// one for the target state.
///
/// # Example
///
/// ```rust
/// use strictmachine::core::Predicate;
///
/// #[derive(Debug, PartialEq)]
/// enum Signal {
///     Data(u32),
///     Reset,
/// }
///
/// let any_data = Predicate::variant(&Signal::Data(0));
/// assert!(any_data.test(&Signal::Data(7)));
/// assert!(!any_data.test(&Signal::Reset));
///
/// let exact = Predicate::eq(Signal::Data(7));
/// assert!(exact.test(&Signal::Data(7)));
/// assert!(!exact.test(&Signal::Data(8)));
/// ```
pub struct Predicate<T: ?Sized> {
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: ?Sized + 'static> Predicate<T> {
    /// Create a predicate from a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }

    /// Predicate that accepts every value.
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    /// Evaluate the predicate.
    pub fn test(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

impl<T: PartialEq + Send + Sync + 'static> Predicate<T> {
    /// Predicate that accepts values equal to `expected`.
    pub fn eq(expected: T) -> Self {
        Self::new(move |value| *value == expected)
    }
}

impl<T: 'static> Predicate<T> {
    /// Predicate that accepts values of the same enum variant as `sample`,
    /// ignoring any payload.
    pub fn variant(sample: &T) -> Self {
        let expected: Discriminant<T> = mem::discriminant(sample);
        Self::new(move |value| mem::discriminant(value) == expected)
    }
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Pure predicate over the machine context that must hold for a transition
/// to fire.
///
/// Guards only receive a shared `&FsmContext`, so they can read the current
/// state and the property bag but cannot fire, shelve, or store anything.
///
/// # Example
///
/// ```rust
/// use strictmachine::core::{Guard, Key};
///
/// # #[derive(Clone, PartialEq, Debug)]
/// # enum Light { Off, On }
/// # impl strictmachine::core::State for Light {
/// #     fn name(&self) -> &str { "Light" }
/// # }
/// # #[derive(Debug)]
/// # struct Toggle;
/// const ARMED: Key<bool> = Key::new("armed");
///
/// let guard: Guard<Light, Toggle> =
///     Guard::new(|ctx| ctx.get(&ARMED).copied().unwrap_or(false));
/// ```
pub struct Guard<S, E> {
    predicate: GuardFn<S, E>,
}

/// Shared guard body.
pub type GuardFn<S, E> = Arc<dyn Fn(&FsmContext<'_, S, E>) -> bool + Send + Sync>;

impl<S: State, E: Event> Guard<S, E> {
    /// Create a guard from a pure predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&FsmContext<'_, S, E>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that never blocks a transition.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Check whether the guard allows the transition.
    pub fn check(&self, ctx: &FsmContext<'_, S, E>) -> bool {
        (self.predicate)(ctx)
    }
}

impl<S: State, E: Event> Default for Guard<S, E> {
    fn default() -> Self {
        Self::always()
    }
}

impl<S, E> Clone for Guard<S, E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S, E> fmt::Debug for Guard<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    enum TestState {
        Initial,
        Processing,
        Complete,
    }

    #[derive(Debug, PartialEq)]
    enum TestEvent {
        Start,
        Progress(u8),
        Finish { ok: bool },
    }

    #[test]
    fn eq_predicate_matches_equal_values() {
        let predicate = Predicate::eq(TestState::Initial);

        assert!(predicate.test(&TestState::Initial));
        assert!(!predicate.test(&TestState::Processing));
    }

    #[test]
    fn variant_predicate_ignores_payload() {
        let predicate = Predicate::variant(&TestEvent::Progress(0));

        assert!(predicate.test(&TestEvent::Progress(0)));
        assert!(predicate.test(&TestEvent::Progress(99)));
        assert!(!predicate.test(&TestEvent::Start));
        assert!(!predicate.test(&TestEvent::Finish { ok: true }));
    }

    #[test]
    fn any_predicate_accepts_everything() {
        let predicate = Predicate::<TestState>::any();

        assert!(predicate.test(&TestState::Initial));
        assert!(predicate.test(&TestState::Complete));
    }

    #[test]
    fn closure_predicate_can_use_complex_logic() {
        let predicate = Predicate::new(|s: &TestState| {
            matches!(s, TestState::Initial | TestState::Processing)
        });

        assert!(predicate.test(&TestState::Initial));
        assert!(predicate.test(&TestState::Processing));
        assert!(!predicate.test(&TestState::Complete));
    }

    #[test]
    fn cloned_predicates_share_behavior() {
        let predicate = Predicate::eq(TestState::Complete);
        let cloned = predicate.clone();

        assert_eq!(
            predicate.test(&TestState::Complete),
            cloned.test(&TestState::Complete)
        );
        assert_eq!(
            predicate.test(&TestState::Initial),
            cloned.test(&TestState::Initial)
        );
    }
}
