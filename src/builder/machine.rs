//! Builder for constructing state machines.

use crate::builder::action::{ActionFromBuilder, ActionToBuilder, ViaBuilder};
use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::config::MachineConfig;
use crate::core::{Event, Predicate, State};
use crate::executor::{Executor, ThreadExecutor};
use crate::logging::{InstanceId, LogSink, Logger, TracingSink};
use crate::machine::{
    ActionProxy, MachineParts, PredicatedTransition, StrictMachine, Transition, TransitionAction,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// A transition as registered; DSL-built entries stay mutable until
/// `build` so a [`GuardBuilder`](crate::builder::GuardBuilder) can attach
/// its guard after the fact.
pub(super) enum TransitionEntry<S, E> {
    Predicated(PredicatedTransition<S, E>),
    Custom(Box<dyn Transition<S, E>>),
}

impl<S: State, E: Event> TransitionEntry<S, E> {
    fn into_boxed(self) -> Box<dyn Transition<S, E>> {
        match self {
            Self::Predicated(transition) => Box::new(transition),
            Self::Custom(transition) => transition,
        }
    }
}

/// Fluent builder for [`StrictMachine`].
///
/// Transitions and actions are kept in registration order, which is also
/// their evaluation order.
///
/// # Example
///
/// ```rust
/// use strictmachine::builder::FsmBuilder;
/// use strictmachine::state_enum;
///
/// state_enum! {
///     enum Door {
///         Open,
///         Closed,
///     }
/// }
///
/// #[derive(Debug, PartialEq)]
/// enum Push {
///     Close,
///     Open,
/// }
///
/// let mut fsm = FsmBuilder::new();
/// fsm.when(Door::Open).on(Push::Close).transition_to(Door::Closed);
/// fsm.when(Door::Closed).on(Push::Open).transition_to(Door::Open);
///
/// let door = fsm.build(Door::Open).unwrap();
/// assert_eq!(door.fire_event_blocking(Push::Close).unwrap(), Door::Closed);
/// ```
pub struct FsmBuilder<S, E> {
    pub(super) transitions: Vec<TransitionEntry<S, E>>,
    pub(super) actions: VecDeque<Box<dyn TransitionAction<S, E>>>,
    proxy: Option<Arc<dyn ActionProxy<S, E>>>,
    sink: Option<Arc<dyn LogSink>>,
    executor: Option<Arc<dyn Executor>>,
    instance_id: Option<InstanceId>,
    config: MachineConfig,
}

impl<S: State, E: Event> FsmBuilder<S, E> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            actions: VecDeque::new(),
            proxy: None,
            sink: None,
            executor: None,
            instance_id: None,
            config: MachineConfig::default(),
        }
    }

    /// Start a transition out of `state`.
    pub fn when(&mut self, state: S) -> TransitionBuilder<'_, S, E> {
        TransitionBuilder::new(self, Predicate::eq(state))
    }

    /// Start a transition out of every state matching `filter`.
    pub fn when_match(&mut self, filter: Predicate<S>) -> TransitionBuilder<'_, S, E> {
        TransitionBuilder::new(self, filter)
    }

    /// Start a transition out of any state.
    pub fn when_any(&mut self) -> TransitionBuilder<'_, S, E> {
        TransitionBuilder::new(self, Predicate::any())
    }

    /// Attach actions to cycles that start and end in `state`.
    pub fn on_internal_transition(&mut self, state: S) -> ViaBuilder<'_, S, E> {
        let filter = Predicate::eq(state);
        ViaBuilder::new(self, filter.clone(), filter)
    }

    /// Attach actions to transitions into `state`.
    pub fn on_transition_to(&mut self, state: S) -> ActionToBuilder<'_, S, E> {
        ActionToBuilder::new(self, Predicate::eq(state))
    }

    /// Attach actions to transitions into any state matching `filter`.
    pub fn on_transition_to_match(&mut self, filter: Predicate<S>) -> ActionToBuilder<'_, S, E> {
        ActionToBuilder::new(self, filter)
    }

    /// Attach actions to transitions out of `state`.
    pub fn on_transition_from(&mut self, state: S) -> ActionFromBuilder<'_, S, E> {
        ActionFromBuilder::new(self, Predicate::eq(state))
    }

    /// Attach actions to transitions out of any state matching `filter`.
    pub fn on_transition_from_match(
        &mut self,
        filter: Predicate<S>,
    ) -> ActionFromBuilder<'_, S, E> {
        ActionFromBuilder::new(self, filter)
    }

    /// Register a hand-written transition after those already added.
    pub fn add_transition(&mut self, transition: impl Transition<S, E> + 'static) -> &mut Self {
        self.transitions.push(TransitionEntry::Custom(Box::new(transition)));
        self
    }

    /// Register a hand-written action after those already added.
    pub fn add_transition_action(
        &mut self,
        action: impl TransitionAction<S, E> + 'static,
    ) -> &mut Self {
        self.actions.push_back(Box::new(action));
        self
    }

    /// Route every action invocation through `proxy`.
    pub fn action_proxy(&mut self, proxy: impl ActionProxy<S, E> + 'static) -> &mut Self {
        self.proxy = Some(Arc::new(proxy));
        self
    }

    /// Send the machine's log lines to `sink` instead of `tracing`.
    pub fn log_sink(&mut self, sink: impl LogSink + 'static) -> &mut Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Run evaluation on `executor`. Without one, `build` spawns a
    /// dedicated [`ThreadExecutor`].
    pub fn executor(&mut self, executor: Arc<dyn Executor>) -> &mut Self {
        self.executor = Some(executor);
        self
    }

    /// Override the automatically assigned instance id.
    pub fn instance_id(&mut self, id: InstanceId) -> &mut Self {
        self.instance_id = Some(id);
        self
    }

    pub fn config(&mut self, config: MachineConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Build the machine in `initial` state.
    pub fn build(self, initial: S) -> Result<StrictMachine<S, E>, BuildError> {
        self.config.validate()?;

        let executor: Arc<dyn Executor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(ThreadExecutor::spawn(self.config.worker_name.clone())?),
        };
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        let logger = Logger::new(
            self.instance_id.unwrap_or_else(InstanceId::next),
            sink,
            self.config.min_log_level,
        );

        Ok(StrictMachine::from_parts(MachineParts {
            initial,
            transitions: self
                .transitions
                .into_iter()
                .map(TransitionEntry::into_boxed)
                .collect(),
            actions: self.actions.into(),
            executor,
            proxy: self.proxy,
            logger,
            log_padding: self.config.log_padding,
        }))
    }
}

impl<S: State, E: Event> Default for FsmBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoopSink;
    use crate::machine::FsmContext;

    crate::state_enum! {
        enum TestState {
            Initial,
            Processing,
            Complete,
        }
        final: [Complete]
    }

    #[derive(Debug, PartialEq)]
    enum TestEvent {
        Begin,
        Finish,
    }

    struct AlwaysTo(TestState);

    impl Transition<TestState, TestEvent> for AlwaysTo {
        fn target(&self) -> &TestState {
            &self.0
        }

        fn matches(
            &self,
            _ctx: &FsmContext<'_, TestState, TestEvent>,
            _state: &TestState,
            _event: &TestEvent,
        ) -> bool {
            true
        }
    }

    #[test]
    fn build_spawns_worker_with_configured_name() {
        let mut fsm = FsmBuilder::<TestState, TestEvent>::new();
        fsm.config(MachineConfig {
            worker_name: "builder-test-worker".to_string(),
            ..MachineConfig::default()
        });
        fsm.when(TestState::Initial)
            .on(TestEvent::Begin)
            .transition_to(TestState::Processing);

        let machine = fsm.build(TestState::Initial).unwrap();

        assert_eq!(
            machine.fire_event_blocking(TestEvent::Begin).unwrap(),
            TestState::Processing
        );
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut fsm = FsmBuilder::<TestState, TestEvent>::new();
        fsm.config(MachineConfig {
            worker_name: "   ".to_string(),
            ..MachineConfig::default()
        });

        assert!(matches!(
            fsm.build(TestState::Initial),
            Err(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn instance_id_override_is_used() {
        let mut fsm = FsmBuilder::<TestState, TestEvent>::new();
        fsm.instance_id(InstanceId::new(4242)).log_sink(NoopSink);

        let machine = fsm.build(TestState::Initial).unwrap();

        assert_eq!(machine.instance_id(), InstanceId::new(4242));
    }

    #[test]
    fn custom_transitions_keep_registration_order() {
        let mut fsm = FsmBuilder::<TestState, TestEvent>::new();
        fsm.add_transition(AlwaysTo(TestState::Complete));
        fsm.when(TestState::Initial)
            .on(TestEvent::Finish)
            .transition_to(TestState::Processing);

        let machine = fsm.build(TestState::Initial).unwrap();

        assert_eq!(
            machine.fire_event_blocking(TestEvent::Finish).unwrap(),
            TestState::Complete
        );
    }

    #[test]
    fn builders_without_rules_are_valid() {
        let machine = FsmBuilder::<TestState, TestEvent>::default()
            .build(TestState::Initial)
            .unwrap();

        assert_eq!(
            machine.fire_event_blocking(TestEvent::Begin).unwrap(),
            TestState::Initial
        );
    }
}
