//! Core value types shared by the engine and the builder.
//!
//! This module contains the pieces that carry no runtime machinery:
//! - State and event bounds via the `State` and `Event` traits
//! - `Predicate` and `Guard` closures used to match transitions
//! - Typed `Key`s for the context property bag

mod guard;
mod key;
mod state;

pub use guard::{Guard, GuardFn, Predicate};
pub use key::Key;
pub(crate) use key::Slot;
pub use state::{Event, State};
