//! Errors raised while building a machine.

use std::io;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to spawn executor worker thread: {0}")]
    ExecutorSpawn(#[from] io::Error),

    #[error("Invalid machine configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_to_spawn_failures() {
        let err: BuildError = io::Error::new(io::ErrorKind::Other, "no threads left").into();

        assert!(matches!(err, BuildError::ExecutorSpawn(_)));
        assert_eq!(
            err.to_string(),
            "Failed to spawn executor worker thread: no threads left"
        );
    }

    #[test]
    fn invalid_config_message() {
        let err = BuildError::InvalidConfig("worker_name cannot be empty".to_string());

        assert_eq!(
            err.to_string(),
            "Invalid machine configuration: worker_name cannot be empty"
        );
    }
}
