//! Per-instance runtime limits.

use serde::{Deserialize, Serialize};

/// Default iteration cap used by [`StateMachine::tick`](super::StateMachine::tick).
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default bound on events dispatched by one `raise` call, cascades included.
pub const DEFAULT_MAX_CASCADE: usize = 1024;

/// Default number of state changes kept in memory.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Runtime configuration for a machine instance.
///
/// Missing fields take their defaults when deserialized, so a partial JSON
/// document is a valid configuration:
///
/// ```rust
/// use hierarch::machine::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_str(r#"{ "max_iterations": 5 }"#).unwrap();
/// assert_eq!(config.max_iterations, 5);
/// assert_eq!(config.max_cascade, MachineConfig::default().max_cascade);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Timers fired per `tick` before yielding back to the caller
    pub max_iterations: usize,
    /// Events dispatched per `raise`, including events raised by callbacks
    pub max_cascade: usize,
    /// State changes retained in history; `None` keeps everything
    pub history_limit: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_cascade: DEFAULT_MAX_CASCADE,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn max_cascade(mut self, n: usize) -> Self {
        self.max_cascade = n;
        self
    }

    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_override_defaults() {
        let config = MachineConfig::new()
            .max_iterations(7)
            .max_cascade(3)
            .history_limit(None);

        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.max_cascade, 3);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: MachineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }
}
