//! Machine configuration.
//!
//! Everything here has a sensible default; a config is usually only loaded
//! from JSON when several machines share one deployment-wide setting.

use crate::builder::BuildError;
use crate::logging::Level;
use serde::{Deserialize, Serialize};

/// Default thread name for the worker created by the builder.
pub const DEFAULT_WORKER_NAME: &str = "strictmachine-worker";

/// Default column width for the `S x E = S'` transition log line.
pub const DEFAULT_LOG_PADDING: usize = 24;

/// Tunables applied when building a machine.
///
/// # Example
///
/// ```rust
/// use strictmachine::config::MachineConfig;
/// use strictmachine::logging::Level;
///
/// let config = MachineConfig::from_json(r#"{ "min_log_level": "warn" }"#).unwrap();
/// assert_eq!(config.min_log_level, Level::Warn);
/// assert_eq!(config.log_padding, 24);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Thread name of the worker spawned when no executor is supplied.
    pub worker_name: String,

    /// Column width used when logging transitions.
    pub log_padding: usize,

    /// Messages below this level are never formatted or sent to the sink.
    pub min_log_level: Level,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            log_padding: DEFAULT_LOG_PADDING,
            min_log_level: Level::Trace,
        }
    }
}

impl MachineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BuildError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.worker_name.trim().is_empty() {
            return Err(BuildError::InvalidConfig(
                "worker_name cannot be empty".to_string(),
            ));
        }
        if self.worker_name.contains('\0') {
            return Err(BuildError::InvalidConfig(
                "worker_name cannot contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}
