//! Timed event entries.

use crate::core::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A pending event owned by one machine instance.
///
/// `repeat == None` fires once. A recurring entry is re-armed relative to its
/// previous due time, so missed periods are caught up one at a time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TimedEvent<E: Event> {
    /// Absolute instant at which the entry becomes due
    pub due: DateTime<Utc>,
    /// The event raised when the entry fires
    pub event: E,
    /// Period between firings of a recurring entry
    pub repeat: Option<Duration>,
    /// Scheduling order, used to break ties between equally-due entries
    pub seq: u64,
}

impl<E: Event> TimedEvent<E> {
    pub fn is_recurring(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Ordering key: earliest due first, then first scheduled.
    pub(crate) fn key(&self) -> (DateTime<Utc>, u64) {
        (self.due, self.seq)
    }
}

/// `from + offset`, saturating at the end of chrono's representable range.
pub(crate) fn offset(from: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(offset)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
