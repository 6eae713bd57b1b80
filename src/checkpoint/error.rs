//! Checkpoint error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reasons a checkpoint cannot be encoded, decoded or restored.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckpointError {
    /// Encoding to JSON or bincode failed
    #[error("Failed to encode checkpoint: {0}")]
    SerializationFailed(String),

    /// Decoding from JSON or bincode failed
    #[error("Failed to decode checkpoint: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The stored current state is not defined in the graph being restored
    /// against
    #[error("Checkpoint names state '{name}', which the graph does not define")]
    UnknownState { name: String },

    /// The stored wake time disagrees with the minimum over the stored timers
    #[error("Stored next wake {stored:?} does not match timers ({recomputed:?})")]
    WakeTimeMismatch {
        stored: Option<DateTime<Utc>>,
        recomputed: Option<DateTime<Utc>>,
    },
}
