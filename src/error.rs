//! Errors surfaced to producers waiting on an event.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by the blocking and async `fire_event_*` variants.
///
/// Failures inside actions never show up here; they are reported through
/// the machine's log sink.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FsmError {
    /// The rendezvous was torn down before the event's resulting state was
    /// delivered (the evaluation unit unwound or the machine was dropped).
    #[error("Wait for event evaluation was interrupted")]
    WaitInterrupted,

    /// The caller stopped waiting. The event is still evaluated.
    #[error("Timed out after {0:?} waiting for event evaluation")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_includes_duration() {
        let err = FsmError::Timeout(Duration::from_millis(250));

        assert_eq!(
            err.to_string(),
            "Timed out after 250ms waiting for event evaluation"
        );
    }
}
