//! Event Shelving
//!
//! This demo holds events that arrive too early on the shelf and replays
//! them once the machine is ready for them.
//!
//! Key concepts:
//! - `shelve_event` from an internal-transition action
//! - `process_shelved_events` on entry to the ready state
//! - Shelved events replay ahead of anything queued later
//! - Sharing counters between actions through the context property bag
//!
//! Run with: RUST_LOG=strictmachine=trace cargo run --example shelving

use std::time::Duration;
use strictmachine::core::Key;
use strictmachine::{state_enum, FsmBuilder};
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Link {
        Connecting,
        Ready,
        Closed,
    }
    final: [Closed]
}

#[derive(Clone, Debug, PartialEq)]
enum LinkEvent {
    Handshake,
    Send(String),
    Close,
}

const SENT: Key<Vec<String>> = Key::new("sent");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strictmachine=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut fsm = FsmBuilder::new();
    fsm.when(Link::Connecting)
        .on(LinkEvent::Handshake)
        .transition_to(Link::Ready)
        .execute(|ctx| {
            tracing::info!(
                shelved = ctx.shelved_events(),
                "link ready, replaying shelf"
            );
            ctx.process_shelved_events();
        });
    fsm.when(Link::Ready)
        .on(LinkEvent::Close)
        .transition_to(Link::Closed);

    // Too early: park it.
    fsm.on_internal_transition(Link::Connecting)
        .via_variant(&LinkEvent::Send(String::new()))
        .execute(|ctx| {
            let event = ctx.event().clone();
            ctx.shelve_event(event);
        });

    fsm.on_internal_transition(Link::Ready)
        .via_variant(&LinkEvent::Send(String::new()))
        .execute(|ctx| {
            if let LinkEvent::Send(payload) = ctx.event().clone() {
                let mut sent = ctx.remove(&SENT).unwrap_or_default();
                sent.push(payload);
                ctx.set(&SENT, sent);
            }
        });

    let link = fsm.build(Link::Connecting)?;

    link.fire_event(LinkEvent::Send("hello".into()));
    link.fire_event(LinkEvent::Send("world".into()));
    link.fire_event(LinkEvent::Handshake);
    link.fire_event(LinkEvent::Send("after handshake".into()));

    let state = link.fire_event_timeout(LinkEvent::Close, Duration::from_secs(1))?;
    let sent = link.get_from_context(|ctx| ctx.get(&SENT).cloned().unwrap_or_default());

    println!("final state: {state:?}");
    println!("delivered in order: {sent:?}");

    Ok(())
}
