//! ATM Connection Lifecycle
//!
//! This demo drives a cash machine's connection lifecycle through a
//! `StrictMachine` and logs every transition.
//!
//! Key concepts:
//! - Declaring a transition table with `FsmBuilder`
//! - Entry and exit actions via `on_transition_to` / `on_transition_from`
//! - Waiting for the state an event produced with `fire_event_blocking`
//!
//! Run with: RUST_LOG=strictmachine=debug cargo run --example atm

use strictmachine::machine::TracingActionProxy;
use strictmachine::{state_enum, BuildError, FsmBuilder, FsmError};
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Atm {
        Idle,
        Loading,
        OutOfService,
        InService,
        Disconnected,
    }
    error: [OutOfService, Disconnected]
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum AtmEvent {
    Connected,
    ConnectionClosed,
    ConnectionLost,
    ConnectionRestored,
    LoadFail,
    LoadSuccess,
    Shutdown,
    Startup,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Fsm(#[from] FsmError),
}

fn main() -> Result<(), DemoError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strictmachine=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut fsm = FsmBuilder::new();
    fsm.action_proxy(TracingActionProxy);

    // Idle
    fsm.when(Atm::Idle)
        .on(AtmEvent::Connected)
        .transition_to(Atm::Loading);

    // Loading
    fsm.when(Atm::Loading)
        .on(AtmEvent::LoadSuccess)
        .transition_to(Atm::InService);
    fsm.when(Atm::Loading)
        .on(AtmEvent::LoadFail)
        .transition_to(Atm::OutOfService);
    fsm.when(Atm::Loading)
        .on(AtmEvent::ConnectionClosed)
        .transition_to(Atm::Disconnected);

    // OutOfService
    fsm.when(Atm::OutOfService)
        .on(AtmEvent::Startup)
        .transition_to(Atm::InService);
    fsm.when(Atm::OutOfService)
        .on(AtmEvent::ConnectionLost)
        .transition_to(Atm::Disconnected);

    // InService
    fsm.when(Atm::InService)
        .on(AtmEvent::ConnectionLost)
        .transition_to(Atm::Disconnected);
    fsm.when(Atm::InService)
        .on(AtmEvent::Shutdown)
        .transition_to(Atm::OutOfService);

    // Disconnected
    fsm.when(Atm::Disconnected)
        .on(AtmEvent::ConnectionRestored)
        .transition_to(Atm::InService);

    fsm.on_transition_to(Atm::InService)
        .from_any()
        .via_any()
        .execute(|ctx| tracing::info!(from = ?ctx.from(), "ATM is serving customers"));
    fsm.on_transition_from(Atm::InService)
        .to_any()
        .via_any()
        .execute(|ctx| {
            if ctx.to() != ctx.from() {
                tracing::warn!(to = ?ctx.to(), via = ?ctx.event(), "ATM left service");
            }
        });

    let atm = fsm.build(Atm::Idle)?;

    for event in [
        AtmEvent::Connected,
        AtmEvent::LoadSuccess,
        AtmEvent::Shutdown,
        AtmEvent::Startup,
        AtmEvent::ConnectionLost,
        AtmEvent::ConnectionRestored,
    ] {
        let state = atm.fire_event_blocking(event)?;
        println!("{event:?} -> {state:?}");
    }

    Ok(())
}
