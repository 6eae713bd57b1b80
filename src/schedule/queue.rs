//! The per-instance timed event queue.

use super::timer::{offset, TimedEvent};
use crate::core::Event;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Ordered collection of pending timed events with a cached wake time.
///
/// `next_wake` always equals the minimum due time over all entries, or
/// `None` when the queue is empty. It is recomputed by every operation that
/// inserts, removes or re-arms an entry and cannot be set directly.
///
/// # Example
///
/// ```rust
/// use hierarch::core::NamedEvent;
/// use hierarch::schedule::TimerQueue;
/// use chrono::{TimeZone, Utc};
/// use std::time::Duration;
///
/// let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let mut timers = TimerQueue::new(start);
///
/// timers.every(Duration::from_secs(60), NamedEvent::new("poll"));
/// timers.after(Duration::from_secs(10), NamedEvent::new("timeout"));
/// assert_eq!(timers.next_wake(), Some(start + chrono::Duration::seconds(10)));
///
/// timers.cancel(&NamedEvent::new("timeout"));
/// assert_eq!(timers.next_wake(), Some(start + chrono::Duration::seconds(60)));
/// ```
#[derive(Clone, Debug)]
pub struct TimerQueue<E: Event> {
    entries: Vec<TimedEvent<E>>,
    clock: DateTime<Utc>,
    next_wake: Option<DateTime<Utc>>,
    next_seq: u64,
}

impl<E: Event> TimerQueue<E> {
    /// Create an empty queue whose clock starts at `clock`.
    pub fn new(clock: DateTime<Utc>) -> Self {
        Self {
            entries: Vec::new(),
            clock,
            next_wake: None,
            next_seq: 0,
        }
    }

    /// Rebuild a queue from persisted parts. The wake time is recomputed.
    pub fn from_parts(clock: DateTime<Utc>, entries: Vec<TimedEvent<E>>, next_seq: u64) -> Self {
        let next_seq = entries
            .iter()
            .map(|entry| entry.seq + 1)
            .max()
            .unwrap_or(0)
            .max(next_seq);
        let mut queue = Self {
            entries,
            clock,
            next_wake: None,
            next_seq,
        };
        queue.recompute();
        queue
    }

    /// The instance clock: the latest instant time has been advanced to.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Move the clock forward. Earlier instants are ignored.
    pub fn set_clock(&mut self, now: DateTime<Utc>) {
        if now > self.clock {
            self.clock = now;
        }
    }

    /// Earliest due time, or `None` when nothing is scheduled.
    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.next_wake
    }

    /// Earliest due time with `DateTime::<Utc>::MAX_UTC` standing in for
    /// "never", suitable for an indexed storage column.
    pub fn next_wake_or_max(&self) -> DateTime<Utc> {
        self.next_wake.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Schedule `event` once at the absolute instant `due`.
    pub fn at(&mut self, due: DateTime<Utc>, event: E) {
        self.insert(due, event, None);
    }

    /// Schedule `event` once, `delay` after the instance clock.
    pub fn after(&mut self, delay: Duration, event: E) {
        self.insert(offset(self.clock, delay), event, None);
    }

    /// Schedule `event` every `interval`, first due one interval from now.
    pub fn every(&mut self, interval: Duration, event: E) {
        self.insert(offset(self.clock, interval), event, Some(interval));
    }

    fn insert(&mut self, due: DateTime<Utc>, event: E, repeat: Option<Duration>) {
        let seq = self.take_seq();
        self.entries.push(TimedEvent {
            due,
            event,
            repeat,
            seq,
        });
        if self.next_wake.map_or(true, |wake| due < wake) {
            self.next_wake = Some(due);
        }
    }

    /// Remove every entry, one-shot or recurring, whose event equals `event`.
    /// Returns the number of entries removed.
    pub fn cancel(&mut self, event: &E) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.event != *event);
        self.recompute();
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recompute();
    }

    /// Check whether any entry is due at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_wake.is_some_and(|wake| wake <= now)
    }

    /// Take the earliest entry due at or before `now` and return its event.
    ///
    /// One-shot entries are removed; recurring entries are re-armed one
    /// interval after their previous due time and queue behind entries that
    /// were already waiting at the same instant.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<E> {
        let position = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_due(now))
            .min_by_key(|(_, entry)| entry.key())
            .map(|(position, _)| position)?;

        let event = match self.entries[position].repeat {
            Some(interval) => {
                let seq = self.take_seq();
                let entry = &mut self.entries[position];
                entry.due = offset(entry.due, interval);
                entry.seq = seq;
                entry.event.clone()
            }
            None => self.entries.remove(position).event,
        };
        self.recompute();
        Some(event)
    }

    pub fn entries(&self) -> &[TimedEvent<E>] {
        &self.entries
    }

    /// Entries sorted by firing order.
    pub fn pending(&self) -> Vec<&TimedEvent<E>> {
        let mut pending: Vec<_> = self.entries.iter().collect();
        pending.sort_by_key(|entry| entry.key());
        pending
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn recompute(&mut self) {
        self.next_wake = self.entries.iter().map(|entry| entry.due).min();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NamedEvent;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    fn ev(name: &str) -> NamedEvent {
        NamedEvent::new(name)
    }

    #[test]
    fn empty_queue_never_wakes() {
        let timers: TimerQueue<NamedEvent> = TimerQueue::new(start());
        assert_eq!(timers.next_wake(), None);
        assert_eq!(timers.next_wake_or_max(), DateTime::<Utc>::MAX_UTC);
        assert!(!timers.is_due(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn sooner_insert_lowers_next_wake() {
        let mut timers = TimerQueue::new(start());
        timers.at(start() + secs(100), ev("late"));
        timers.at(start() + secs(10), ev("early"));
        timers.at(start() + secs(50), ev("middle"));

        assert_eq!(timers.next_wake(), Some(start() + secs(10)));
    }

    #[test]
    fn after_and_every_are_relative_to_clock() {
        let mut timers = TimerQueue::new(start());
        timers.set_clock(start() + secs(30));
        timers.after(Duration::from_secs(5), ev("once"));
        timers.every(Duration::from_secs(60), ev("poll"));

        let pending = timers.pending();
        assert_eq!(pending[0].due, start() + secs(35));
        assert_eq!(pending[1].due, start() + secs(90));
        assert!(pending[1].is_recurring());
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut timers: TimerQueue<NamedEvent> = TimerQueue::new(start());
        timers.set_clock(start() - secs(10));
        assert_eq!(timers.now(), start());
    }

    #[test]
    fn cancel_removes_one_shot_and_recurring() {
        let mut timers = TimerQueue::new(start());
        timers.after(Duration::from_secs(5), ev("ping"));
        timers.every(Duration::from_secs(20), ev("ping"));
        timers.after(Duration::from_secs(40), ev("other"));

        assert_eq!(timers.cancel(&ev("ping")), 2);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_wake(), Some(start() + secs(40)));

        assert_eq!(timers.cancel(&ev("other")), 1);
        assert_eq!(timers.next_wake(), None);
    }

    #[test]
    fn pop_due_returns_nothing_before_due() {
        let mut timers = TimerQueue::new(start());
        timers.after(Duration::from_secs(10), ev("later"));

        assert_eq!(timers.pop_due(start() + secs(9)), None);
        assert_eq!(timers.pop_due(start() + secs(10)), Some(ev("later")));
        assert!(timers.is_empty());
        assert_eq!(timers.next_wake(), None);
    }

    #[test]
    fn pop_due_takes_earliest_first() {
        let mut timers = TimerQueue::new(start());
        timers.at(start() + secs(3), ev("c"));
        timers.at(start() + secs(1), ev("a"));
        timers.at(start() + secs(2), ev("b"));

        let now = start() + secs(5);
        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(now)).collect();
        assert_eq!(order, vec![ev("a"), ev("b"), ev("c")]);
    }

    #[test]
    fn ties_go_to_first_scheduled() {
        let mut timers = TimerQueue::new(start());
        let due = start() + secs(10);
        timers.at(due, ev("first"));
        timers.at(due, ev("second"));
        timers.at(due, ev("third"));

        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(due)).collect();
        assert_eq!(order, vec![ev("first"), ev("second"), ev("third")]);
    }

    #[test]
    fn recurring_entry_rearms_from_previous_due() {
        let mut timers = TimerQueue::new(start());
        timers.every(Duration::from_secs(10), ev("beat"));

        // Far past several periods: each pop moves due by exactly one period.
        let now = start() + secs(35);
        assert_eq!(timers.pop_due(now), Some(ev("beat")));
        assert_eq!(timers.next_wake(), Some(start() + secs(20)));
        assert_eq!(timers.pop_due(now), Some(ev("beat")));
        assert_eq!(timers.pop_due(now), Some(ev("beat")));
        assert_eq!(timers.pop_due(now), None);
        assert_eq!(timers.next_wake(), Some(start() + secs(40)));
    }

    #[test]
    fn rearmed_entry_queues_behind_waiting_ties() {
        let mut timers = TimerQueue::new(start());
        timers.every(Duration::ZERO, ev("spin"));
        timers.at(start(), ev("once"));

        assert_eq!(timers.pop_due(start()), Some(ev("spin")));
        assert_eq!(timers.pop_due(start()), Some(ev("once")));
        assert_eq!(timers.pop_due(start()), Some(ev("spin")));
    }

    #[test]
    fn from_parts_recomputes_wake_and_sequence() {
        let mut timers = TimerQueue::new(start());
        timers.after(Duration::from_secs(7), ev("a"));
        timers.after(Duration::from_secs(3), ev("b"));

        let rebuilt = TimerQueue::from_parts(timers.now(), timers.entries().to_vec(), 0);
        assert_eq!(rebuilt.next_wake(), Some(start() + secs(3)));
        assert_eq!(rebuilt.next_seq(), 2);
    }
}
