//! State and event traits for machine values.
//!
//! The engine never looks inside a state or an event beyond equality and
//! the predicates registered with it. These traits only pin down the bounds
//! needed to move values between producer threads and the dispatch worker.

use std::fmt::Debug;

/// Trait for state machine states.
///
/// Exactly one value of `S` is "current" at any instant; the machine clones
/// it out to readers and into callbacks.
///
/// # Required Traits
///
/// - `Clone`: the current state is cloned out to readers and callbacks
/// - `PartialEq`: transitions declared against a concrete state compare by equality
/// - `Debug`: states appear in transition logs
/// - `Send` + `Sync`: states cross from the dispatch worker to producers
///
/// # Example
///
/// ```rust
/// use strictmachine::core::State;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Door {
///     Open,
///     Closed,
///     Broken,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Broken => "Broken",
///         }
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Broken)
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// assert!(Door::Broken.is_error());
/// ```
pub trait State: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// The engine does not stop evaluating events in a final state; this is
    /// informational for callers.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

/// Marker trait for machine events.
///
/// Blanket-implemented for every `Debug + Send + Sync + 'static` type, so
/// plain enums, enums with payloads, and structs all qualify.
pub trait Event: Debug + Send + Sync + 'static {}

impl<T> Event for T where T: Debug + Send + Sync + 'static {}
