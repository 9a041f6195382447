//! StrictMachine: a concurrent finite state machine with strictly serialized
//! event evaluation.
//!
//! Any number of threads may fire events at a machine. Events are queued and
//! evaluated one at a time on an [`Executor`], in the order they were
//! queued; at most one evaluation is ever in flight for a given machine.
//!
//! # Core Concepts
//!
//! - **State / Event**: user types; states implement [`State`], any
//!   `Debug + Send + Sync` type is an [`Event`]
//! - **Transitions**: ordered rules, first match wins, no match keeps the
//!   current state
//! - **Actions**: side effects run after every evaluation whose
//!   `(from, to, event)` triple they match, in registration order
//! - **Context**: a typed property bag plus the event shelf, shared by the
//!   guards and actions of one machine
//!
//! # Example
//!
//! ```rust
//! use strictmachine::core::Key;
//! use strictmachine::{state_enum, FsmBuilder};
//!
//! state_enum! {
//!     enum Turnstile {
//!         Locked,
//!         Unlocked,
//!     }
//! }
//!
//! #[derive(Debug, PartialEq)]
//! enum Input {
//!     Coin,
//!     Push,
//! }
//!
//! const PASSES: Key<u32> = Key::new("passes");
//!
//! let mut fsm = FsmBuilder::new();
//! fsm.when(Turnstile::Locked).on(Input::Coin).transition_to(Turnstile::Unlocked);
//! fsm.when(Turnstile::Unlocked)
//!     .on(Input::Push)
//!     .transition_to(Turnstile::Locked)
//!     .execute(|ctx| {
//!         let passes = ctx.get(&PASSES).copied().unwrap_or(0);
//!         ctx.set(&PASSES, passes + 1);
//!     });
//!
//! let turnstile = fsm.build(Turnstile::Locked).unwrap();
//! turnstile.fire_event(Input::Coin);
//! assert_eq!(turnstile.fire_event_blocking(Input::Push).unwrap(), Turnstile::Locked);
//! assert_eq!(turnstile.get_from_context(|ctx| ctx.get(&PASSES).copied()), Some(1));
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod executor;
pub mod logging;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, FsmBuilder};
pub use config::MachineConfig;
pub use core::{Event, Guard, Key, Predicate, State};
pub use error::FsmError;
pub use executor::{Executor, ThreadExecutor};
pub use logging::{InstanceId, Level, LogSink};
pub use machine::{ActionContext, ActionError, FsmContext, StrictMachine};
