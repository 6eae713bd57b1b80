//! The view of a machine handed to entry, exit and transition callbacks.

use crate::core::{Event, StateGraph, StateId};
use crate::schedule::TimerQueue;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Mutable access to an instance from inside its own callbacks.
///
/// Scheduling calls take effect immediately, so a timer armed by an entry
/// action is visible to the very next iteration of an ongoing `advance`.
/// Events raised here are queued and dispatched after the current
/// transition has committed, before the outer call returns.
pub struct Context<'a, M, E: Event> {
    graph: &'a StateGraph<M, E>,
    data: &'a mut M,
    timers: &'a mut TimerQueue<E>,
    raised: &'a mut VecDeque<E>,
    state: StateId,
}

impl<'a, M, E: Event> Context<'a, M, E> {
    pub(crate) fn new(
        graph: &'a StateGraph<M, E>,
        data: &'a mut M,
        timers: &'a mut TimerQueue<E>,
        raised: &'a mut VecDeque<E>,
        state: StateId,
    ) -> Self {
        Self {
            graph,
            data,
            timers,
            raised,
            state,
        }
    }

    pub fn data(&self) -> &M {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut M {
        self.data
    }

    pub fn graph(&self) -> &StateGraph<M, E> {
        self.graph
    }

    /// The state that was current when dispatch of this event began.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// Hierarchical check against [`state`](Self::state).
    pub fn is_in(&self, state: StateId) -> bool {
        self.graph.is(self.state, state)
    }

    /// The instance clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.timers.now()
    }

    pub fn at(&mut self, due: DateTime<Utc>, event: E) {
        self.timers.at(due, event);
    }

    pub fn after(&mut self, delay: Duration, event: E) {
        self.timers.after(delay, event);
    }

    pub fn every(&mut self, interval: Duration, event: E) {
        self.timers.every(interval, event);
    }

    pub fn cancel(&mut self, event: &E) -> usize {
        self.timers.cancel(event)
    }

    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.timers.next_wake()
    }

    /// Queue `event` for dispatch once the current transition completes.
    pub fn raise(&mut self, event: E) {
        self.raised.push_back(event);
    }
}
