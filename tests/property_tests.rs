//! Property-based tests for event ordering and action ordering.
//!
//! A machine fed from one producer must end up exactly where a sequential
//! replay of the same events against the same table ends up, and must run
//! its actions in the order the builder registered them.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use strictmachine::core::State;
use strictmachine::logging::NoopSink;
use strictmachine::{state_enum, FsmBuilder, StrictMachine};

state_enum! {
    enum Phase {
        Initial,
        Processing,
        Complete,
        Failed,
    }
    final: [Complete, Failed]
    error: [Failed]
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Signal {
    Start,
    Advance,
    Fail,
    Reset,
}

/// The transition table, as a pure function.
fn replay_step(state: Phase, signal: Signal) -> Phase {
    match (state, signal) {
        (Phase::Initial, Signal::Start) => Phase::Processing,
        (Phase::Processing, Signal::Advance) => Phase::Complete,
        (Phase::Processing, Signal::Fail) => Phase::Failed,
        (_, Signal::Reset) => Phase::Initial,
        (state, _) => state,
    }
}

type Trace = Arc<Mutex<Vec<(Phase, Phase, Signal)>>>;

fn build_machine(trace: &Trace) -> StrictMachine<Phase, Signal> {
    let mut fsm = FsmBuilder::new();
    fsm.log_sink(NoopSink);
    fsm.when(Phase::Initial)
        .on(Signal::Start)
        .transition_to(Phase::Processing);
    fsm.when(Phase::Processing)
        .on(Signal::Advance)
        .transition_to(Phase::Complete);
    fsm.when(Phase::Processing)
        .on(Signal::Fail)
        .transition_to(Phase::Failed);
    fsm.when_any()
        .on(Signal::Reset)
        .transition_to(Phase::Initial);

    let trace = Arc::clone(trace);
    fsm.on_transition_to_match(strictmachine::Predicate::any())
        .from_any()
        .via_any()
        .execute(move |ctx| {
            trace.lock().push((*ctx.from(), *ctx.to(), *ctx.event()));
        });

    fsm.build(Phase::Initial).unwrap()
}

prop_compose! {
    fn arbitrary_phase()(variant in 0..4u8) -> Phase {
        match variant {
            0 => Phase::Initial,
            1 => Phase::Processing,
            2 => Phase::Complete,
            _ => Phase::Failed,
        }
    }
}

fn arbitrary_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![
        Just(Signal::Start),
        Just(Signal::Advance),
        Just(Signal::Fail),
        Just(Signal::Reset),
    ]
}

#[derive(Clone, Copy, Debug)]
enum Placement {
    Last,
    First,
}

fn arbitrary_placement() -> impl Strategy<Value = Placement> {
    prop_oneof![Just(Placement::Last), Just(Placement::First)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn single_producer_matches_sequential_replay(
        signals in prop::collection::vec(arbitrary_signal(), 1..40)
    ) {
        let trace = Trace::default();
        let machine = build_machine(&trace);

        let (last, rest) = signals.split_last().unwrap();
        for signal in rest {
            machine.fire_event(*signal);
        }
        let final_state = machine.fire_event_blocking(*last).unwrap();

        let mut expected_trace = Vec::new();
        let mut state = Phase::Initial;
        for signal in &signals {
            let next = replay_step(state, *signal);
            expected_trace.push((state, next, *signal));
            state = next;
        }

        prop_assert_eq!(final_state, state);
        prop_assert_eq!(machine.state(), state);
        prop_assert_eq!(trace.lock().clone(), expected_trace);
    }

    #[test]
    fn action_order_follows_placement(
        placements in prop::collection::vec(arbitrary_placement(), 1..12)
    ) {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut fsm = FsmBuilder::<Phase, Signal>::new();
        fsm.log_sink(NoopSink);
        fsm.when(Phase::Initial).on(Signal::Start).transition_to(Phase::Processing);

        let mut expected = VecDeque::new();
        for (index, placement) in placements.iter().enumerate() {
            let order = Arc::clone(&order);
            let actions = fsm
                .on_transition_from(Phase::Initial)
                .to(Phase::Processing)
                .via(Signal::Start);
            match placement {
                Placement::Last => {
                    actions.execute_last(move |_| order.lock().push(index));
                    expected.push_back(index);
                }
                Placement::First => {
                    actions.execute_first(move |_| order.lock().push(index));
                    expected.push_front(index);
                }
            }
        }

        let machine = fsm.build(Phase::Initial).unwrap();
        machine.fire_event_blocking(Signal::Start).unwrap();

        prop_assert_eq!(order.lock().clone(), Vec::from(expected));
    }

    #[test]
    fn state_name_is_stable(state in arbitrary_phase()) {
        prop_assert_eq!(state.name(), state.name());
        prop_assert_eq!(state.name(), format!("{state:?}"));
    }

    #[test]
    fn error_states_are_final(state in arbitrary_phase()) {
        prop_assert!(!state.is_error() || state.is_final());
    }
}
