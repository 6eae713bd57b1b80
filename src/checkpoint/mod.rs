//! Checkpoint and restore for machine instances.
//!
//! A checkpoint reduces an instance to primitives: the current state by
//! name, the timer entries, the clock and the domain data. Callbacks are not
//! part of a checkpoint; they come back from the [`StateGraph`] the
//! checkpoint is restored against.
//!
//! Storing the checkpoint durably, and keeping two processes from advancing
//! the same instance at once, is left to the caller.

use crate::core::{Event, StateGraph};
use crate::machine::{MachineConfig, MachineData, StateMachine};
use crate::schedule::{TimedEvent, TimerQueue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one machine instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "M: Serialize", deserialize = "M: Deserialize<'de>"))]
pub struct Checkpoint<M, E: Event> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// Wall time when the checkpoint was taken
    pub timestamp: DateTime<Utc>,

    /// Name of the current state, if one is established
    pub state: Option<String>,

    /// Instance clock
    pub clock: DateTime<Utc>,

    /// Earliest due timer, stored for indexing; recomputed on restore
    pub next_wake: Option<DateTime<Utc>>,

    /// Next scheduling sequence number
    pub next_seq: u64,

    /// Pending timer entries
    pub timers: Vec<TimedEvent<E>>,

    /// Domain data
    pub data: M,
}

impl<M, E: Event> Checkpoint<M, E> {
    /// Wake time with `MAX_UTC` meaning "never", for an indexed column.
    pub fn next_wake_or_max(&self) -> DateTime<Utc> {
        self.next_wake.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn to_json(&self) -> Result<String, CheckpointError>
    where
        M: Serialize,
    {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError>
    where
        M: for<'de> Deserialize<'de>,
    {
        serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError>
    where
        M: Serialize,
    {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError>
    where
        M: for<'de> Deserialize<'de>,
    {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}

impl<M: MachineData + Clone, E: Event> StateMachine<M, E> {
    /// Snapshot this instance.
    pub fn checkpoint(&self) -> Checkpoint<M, E> {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            state: self.current_state_name().map(str::to_string),
            clock: self.timers.now(),
            next_wake: self.timers.next_wake(),
            next_seq: self.timers.next_seq(),
            timers: self.timers.entries().to_vec(),
            data: self.data.clone(),
        }
    }
}

impl<M: MachineData, E: Event> StateMachine<M, E> {
    /// Rebuild an instance from a checkpoint against `graph`, with the
    /// default [`MachineConfig`].
    ///
    /// Configuration is not part of a checkpoint. Use
    /// [`restore_with_config`](Self::restore_with_config) to keep custom
    /// iteration caps or history bounds across a reload.
    pub fn restore(
        graph: Arc<StateGraph<M, E>>,
        checkpoint: Checkpoint<M, E>,
    ) -> Result<Self, CheckpointError> {
        Self::restore_with_config(graph, checkpoint, MachineConfig::default())
    }

    /// Rebuild an instance from a checkpoint against `graph`, running it
    /// under `config`. No entry actions run.
    pub fn restore_with_config(
        graph: Arc<StateGraph<M, E>>,
        checkpoint: Checkpoint<M, E>,
        config: MachineConfig,
    ) -> Result<Self, CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let current = match checkpoint.state {
            Some(name) => match graph.lookup(&name) {
                Some(id) => Some(id),
                None => return Err(CheckpointError::UnknownState { name }),
            },
            None => None,
        };

        let timers =
            TimerQueue::from_parts(checkpoint.clock, checkpoint.timers, checkpoint.next_seq);
        if timers.next_wake() != checkpoint.next_wake {
            return Err(CheckpointError::WakeTimeMismatch {
                stored: checkpoint.next_wake,
                recomputed: timers.next_wake(),
            });
        }

        Ok(Self::from_parts(graph, current, checkpoint.data, timers, config))
    }
}
