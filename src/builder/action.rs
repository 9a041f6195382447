//! Action DSL: `on_transition_to(..).from(..).via(..).execute(..)` and
//! friends.

use crate::builder::machine::FsmBuilder;
use crate::core::{Event, Predicate, State};
use crate::machine::{
    action_fn, fallible_action_fn, ActionContext, ActionError, PredicatedTransitionAction,
};
use std::fmt::Display;

/// Selects the source of an action whose target is already chosen.
pub struct ActionToBuilder<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    to: Predicate<S>,
}

impl<'a, S: State, E: Event> ActionToBuilder<'a, S, E> {
    pub(super) fn new(builder: &'a mut FsmBuilder<S, E>, to: Predicate<S>) -> Self {
        Self { builder, to }
    }

    pub fn from(self, state: S) -> ViaBuilder<'a, S, E> {
        self.from_match(Predicate::eq(state))
    }

    pub fn from_match(self, filter: Predicate<S>) -> ViaBuilder<'a, S, E> {
        ViaBuilder::new(self.builder, filter, self.to)
    }

    pub fn from_any(self) -> ViaBuilder<'a, S, E> {
        self.from_match(Predicate::any())
    }
}

/// Selects the target of an action whose source is already chosen.
pub struct ActionFromBuilder<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    from: Predicate<S>,
}

impl<'a, S: State, E: Event> ActionFromBuilder<'a, S, E> {
    pub(super) fn new(builder: &'a mut FsmBuilder<S, E>, from: Predicate<S>) -> Self {
        Self { builder, from }
    }

    pub fn to(self, state: S) -> ViaBuilder<'a, S, E> {
        self.to_match(Predicate::eq(state))
    }

    pub fn to_match(self, filter: Predicate<S>) -> ViaBuilder<'a, S, E> {
        ViaBuilder::new(self.builder, self.from, filter)
    }

    pub fn to_any(self) -> ViaBuilder<'a, S, E> {
        self.to_match(Predicate::any())
    }
}

/// Selects the event of an action.
pub struct ViaBuilder<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    from: Predicate<S>,
    to: Predicate<S>,
}

impl<'a, S: State, E: Event> ViaBuilder<'a, S, E> {
    pub(super) fn new(
        builder: &'a mut FsmBuilder<S, E>,
        from: Predicate<S>,
        to: Predicate<S>,
    ) -> Self {
        Self { builder, from, to }
    }

    pub fn via(self, event: E) -> ActionBuilder<'a, S, E>
    where
        E: PartialEq,
    {
        self.via_match(Predicate::eq(event))
    }

    /// Match any event of the same enum variant as `sample`.
    pub fn via_variant(self, sample: &E) -> ActionBuilder<'a, S, E> {
        self.via_match(Predicate::variant(sample))
    }

    pub fn via_match(self, filter: Predicate<E>) -> ActionBuilder<'a, S, E> {
        ActionBuilder::new(self.builder, self.from, self.to, filter)
    }

    pub fn via_any(self) -> ActionBuilder<'a, S, E> {
        self.via_match(Predicate::any())
    }
}

/// Registers actions for one `(from, to, via)` filter triple.
///
/// `execute` and `execute_last` append to the machine's action list,
/// `execute_first` prepends. Calls chain, so
///
/// ```text
/// .execute(a0).execute_last(a1).execute_first(a2)
/// ```
///
/// runs `a2, a0, a1`.
pub struct ActionBuilder<'a, S, E> {
    builder: &'a mut FsmBuilder<S, E>,
    from: Predicate<S>,
    to: Predicate<S>,
    via: Predicate<E>,
}

impl<'a, S: State, E: Event> ActionBuilder<'a, S, E> {
    pub(super) fn new(
        builder: &'a mut FsmBuilder<S, E>,
        from: Predicate<S>,
        to: Predicate<S>,
        via: Predicate<E>,
    ) -> Self {
        Self {
            builder,
            from,
            to,
            via,
        }
    }

    /// Same as [`execute_last`](Self::execute_last).
    pub fn execute<F>(self, action: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        self.execute_last(action)
    }

    pub fn execute_last<F>(self, action: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        let action = self.predicated(action_fn(action));
        self.builder.actions.push_back(Box::new(action));
        self
    }

    pub fn execute_first<F>(self, action: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        let action = self.predicated(action_fn(action));
        self.builder.actions.push_front(Box::new(action));
        self
    }

    /// Append a fallible action. An `Err` is logged as
    /// [`ActionError::Failed`] and does not stop later actions.
    pub fn try_execute<F, Er>(self, action: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) -> Result<(), Er> + Send + Sync + 'static,
        Er: Display,
    {
        let action = self.predicated(fallible_action_fn(move |ctx| {
            action(ctx).map_err(ActionError::failed)
        }));
        self.builder.actions.push_back(Box::new(action));
        self
    }

    fn predicated(&self, body: crate::machine::ActionFn<S, E>) -> PredicatedTransitionAction<S, E> {
        PredicatedTransitionAction::new(
            self.from.clone(),
            self.to.clone(),
            self.via.clone(),
            body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ThreadExecutor;
    use crate::StrictMachine;
    use parking_lot::Mutex;
    use std::sync::Arc;

    crate::state_enum! {
        enum TestState {
            A,
            B,
            C,
        }
    }

    #[derive(Debug, PartialEq)]
    enum TestEvent {
        Next,
        Stay,
        Data(u32),
    }

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn builder() -> FsmBuilder<TestState, TestEvent> {
        let mut fsm = FsmBuilder::new();
        let worker = ThreadExecutor::spawn("action-builder-test").unwrap();
        fsm.executor(Arc::new(worker));
        fsm.when(TestState::A)
            .on(TestEvent::Next)
            .transition_to(TestState::B);
        fsm.when(TestState::B)
            .on(TestEvent::Next)
            .transition_to(TestState::C);
        fsm
    }

    fn record(
        log: &Log,
        label: &'static str,
    ) -> impl Fn(&mut ActionContext<'_, TestState, TestEvent>) + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_| log.lock().push(label)
    }

    fn run(
        fsm: FsmBuilder<TestState, TestEvent>,
        events: Vec<TestEvent>,
    ) -> StrictMachine<TestState, TestEvent> {
        let machine = fsm.build(TestState::A).unwrap();
        for event in events {
            machine.fire_event_blocking(event).unwrap();
        }
        machine
    }

    #[test]
    fn on_transition_to_from_any() {
        let log = Log::default();
        let mut fsm = builder();
        fsm.on_transition_to(TestState::C)
            .from_any()
            .via_any()
            .execute(record(&log, "entered C"));

        run(fsm, vec![TestEvent::Next, TestEvent::Next]);

        assert_eq!(*log.lock(), vec!["entered C"]);
    }

    #[test]
    fn on_transition_from_to_any() {
        let log = Log::default();
        let mut fsm = builder();
        fsm.on_transition_from(TestState::A)
            .to_any()
            .via_any()
            .execute(record(&log, "left A"));

        // The first Stay is an internal A -> A cycle, which also leaves "from A".
        run(fsm, vec![TestEvent::Stay, TestEvent::Next, TestEvent::Next]);

        assert_eq!(*log.lock(), vec!["left A", "left A"]);
    }

    #[test]
    fn internal_transition_actions_run_on_unhandled_events() {
        let log = Log::default();
        let mut fsm = builder();
        fsm.on_internal_transition(TestState::A)
            .via(TestEvent::Stay)
            .execute(record(&log, "stayed"));

        let machine = run(fsm, vec![TestEvent::Stay, TestEvent::Stay]);

        assert_eq!(machine.state(), TestState::A);
        assert_eq!(*log.lock(), vec!["stayed", "stayed"]);
    }

    #[test]
    fn via_variant_matches_any_payload() {
        let log = Log::default();
        let mut fsm = builder();
        fsm.on_internal_transition(TestState::A)
            .via_variant(&TestEvent::Data(0))
            .execute(record(&log, "data"));

        let events = vec![TestEvent::Data(1), TestEvent::Stay, TestEvent::Data(2)];
        run(fsm, events);

        assert_eq!(*log.lock(), vec!["data", "data"]);
    }

    #[test]
    fn execute_first_and_last_order() {
        let log = Log::default();
        let mut fsm = builder();
        fsm.on_transition_from(TestState::A)
            .to(TestState::B)
            .via(TestEvent::Next)
            .execute(record(&log, "0"))
            .execute_last(record(&log, "1"))
            .execute_first(record(&log, "2"));

        run(fsm, vec![TestEvent::Next]);

        assert_eq!(*log.lock(), vec!["2", "0", "1"]);
    }

    #[test]
    fn failing_action_does_not_stop_the_next() {
        let log = Log::default();
        let mut fsm = builder();
        fsm.on_transition_to(TestState::B)
            .from(TestState::A)
            .via_any()
            .try_execute(|_| Err("nope"))
            .execute(record(&log, "after failure"));

        let machine = run(fsm, vec![TestEvent::Next]);

        assert_eq!(machine.state(), TestState::B);
        assert_eq!(*log.lock(), vec!["after failure"]);
    }
}
