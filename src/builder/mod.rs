//! Fluent DSL for declaring a machine's transitions and actions.
//!
//! Every `when(..)` / `on_transition_*(..)` chain registers its rule on the
//! [`FsmBuilder`] as soon as the chain is complete; `build` then freezes the
//! tables into a [`StrictMachine`](crate::StrictMachine).
//!
//! ```rust
//! use strictmachine::builder::FsmBuilder;
//! use strictmachine::state_enum;
//!
//! state_enum! {
//!     enum Light {
//!         Off,
//!         On,
//!     }
//! }
//!
//! #[derive(Debug, PartialEq)]
//! enum Switch {
//!     Toggle,
//! }
//!
//! let mut fsm = FsmBuilder::new();
//! fsm.when(Light::Off).on(Switch::Toggle).transition_to(Light::On);
//! fsm.when(Light::On).on(Switch::Toggle).transition_to(Light::Off);
//! fsm.on_transition_to(Light::On)
//!     .from_any()
//!     .via_any()
//!     .execute(|ctx| println!("{:?} -> {:?}", ctx.from(), ctx.to()));
//!
//! let light = fsm.build(Light::Off).unwrap();
//! assert_eq!(light.fire_event_blocking(Switch::Toggle).unwrap(), Light::On);
//! ```

mod action;
pub mod error;
mod machine;
pub mod macros;
mod transition;

pub use action::{ActionBuilder, ActionFromBuilder, ActionToBuilder, ViaBuilder};
pub use error::BuildError;
pub use machine::FsmBuilder;
pub use transition::{GuardBuilder, TransitionBuilder, TransitionTo};
