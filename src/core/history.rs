//! State transition history tracking.
//!
//! Records every committed state change of one machine instance, stamped with
//! the instance clock rather than wall time.

use super::event::Event;
use super::state::StateId;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed state change.
#[derive(Clone, Debug, PartialEq)]
pub struct StateTransition<E> {
    /// The state being left
    pub from: StateId,
    /// The state being entered
    pub to: StateId,
    /// The event whose handler produced the change
    pub event: E,
    /// Instance clock when the change committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, optionally bounded history of state changes.
///
/// When a limit is set the oldest records are discarded first.
#[derive(Clone, Debug)]
pub struct StateHistory<E> {
    transitions: VecDeque<StateTransition<E>>,
    limit: Option<usize>,
}

impl<E: Event> Default for StateHistory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> StateHistory<E> {
    /// Create an unbounded, empty history.
    pub fn new() -> Self {
        Self {
            transitions: VecDeque::new(),
            limit: None,
        }
    }

    /// Create an empty history that keeps at most `limit` records.
    /// A limit of zero disables recording.
    pub fn bounded(limit: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit: Some(limit),
        }
    }

    pub fn record(&mut self, transition: StateTransition<E>) {
        if self.limit == Some(0) {
            return;
        }
        if let Some(limit) = self.limit {
            while self.transitions.len() >= limit {
                self.transitions.pop_front();
            }
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the oldest retained record, then the `to`
    /// state of each record in order.
    pub fn get_path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition<E>> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition<E>> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NamedEvent;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn change(from: usize, to: usize, secs: i64) -> StateTransition<NamedEvent> {
        StateTransition {
            from: StateId::from_index(from),
            to: StateId::from_index(to),
            event: NamedEvent::new("go"),
            timestamp: at(secs),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<NamedEvent> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let mut history = StateHistory::new();
        history.record(change(0, 1, 0));
        history.record(change(1, 2, 5));

        let path: Vec<usize> = history.get_path().iter().map(|s| s.index()).collect();
        assert_eq!(path, vec![0, 1, 2]);
    }

    #[test]
    fn duration_uses_recorded_clock() {
        let mut history = StateHistory::new();
        history.record(change(0, 1, 0));
        history.record(change(1, 2, 90));

        assert_eq!(history.duration(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let mut history = StateHistory::new();
        history.record(change(0, 1, 10));

        assert_eq!(history.duration(), Some(Duration::ZERO));
    }

    #[test]
    fn bounded_history_drops_oldest() {
        let mut history = StateHistory::bounded(2);
        history.record(change(0, 1, 0));
        history.record(change(1, 2, 1));
        history.record(change(2, 3, 2));

        assert_eq!(history.len(), 2);
        let path: Vec<usize> = history.get_path().iter().map(|s| s.index()).collect();
        assert_eq!(path, vec![1, 2, 3]);
    }

    #[test]
    fn zero_limit_disables_recording() {
        let mut history = StateHistory::bounded(0);
        history.record(change(0, 1, 0));
        assert!(history.is_empty());
    }
}
