//! Runtime errors raised by machine instances.

use thiserror::Error;

/// Errors that can occur while driving a machine instance.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error("No current state established. Set an initial state before raising events")]
    NoCurrentState,

    #[error("State '{name}' is not defined in the state graph")]
    UnknownState { name: String },

    #[error("Ancestry of state '{state}' exceeds the depth limit of {max}")]
    AncestryTooDeep { state: String, max: usize },

    #[error("Event cascade exceeded {limit} events in a single dispatch")]
    CascadeLimit { limit: usize },
}
