//! Running state machine instances.

use crate::core::{Event, StateGraph, StateHistory, StateId, StateTransition};
use crate::machine::config::MachineConfig;
use crate::machine::context::Context;
use crate::machine::error::MachineError;
use crate::machine::transition::{entry_path, exit_path, find_handler};
use crate::schedule::TimerQueue;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Domain data carried by a machine instance.
///
/// The hook has a no-op default, so most types implement this trait with an
/// empty `impl` block.
pub trait MachineData {
    /// Called after exit and entry actions ran, just before `to` becomes the
    /// current state.
    fn before_state_change(&mut self, from: StateId, to: StateId) {
        let _ = (from, to);
    }
}

impl MachineData for () {}

/// A committed state change, delivered to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange<E> {
    pub from: StateId,
    pub to: StateId,
    pub event: E,
    /// Instance clock when the change committed
    pub at: DateTime<Utc>,
}

/// Summary of one `raise` call, cascaded events included.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatch<E> {
    /// Events dispatched, including those raised by callbacks
    pub events: usize,
    /// Events no state on the ancestor chain had a rule for
    pub ignored: usize,
    /// Committed changes, in order
    pub changes: Vec<StateChange<E>>,
}

impl<E> Dispatch<E> {
    fn empty() -> Self {
        Self {
            events: 0,
            ignored: 0,
            changes: Vec::new(),
        }
    }

    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Summary of one `advance` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advance {
    /// Timers fired
    pub fired: usize,
    /// State changes caused by fired timers and their cascades
    pub changes: usize,
    /// Due timers remain because the iteration cap was reached; call again
    pub backlog: bool,
}

type Listener<E> = Box<dyn FnMut(&StateChange<E>) + Send>;

/// One running instance of a state machine.
///
/// All mutation goes through `&mut self`, so a single instance is never
/// driven by two threads at once. Wrap it in a
/// [`SharedMachine`](super::SharedMachine) to share it.
///
/// # Example
///
/// ```rust
/// use hierarch::builder::{MachineBuilder, StateGraphBuilder};
/// use hierarch::core::NamedEvent;
/// use chrono::{TimeZone, Utc};
/// use std::time::Duration;
///
/// let mut graph = StateGraphBuilder::<(), NamedEvent>::new();
/// let closed = graph.define_root("Closed").unwrap();
/// let open = graph.define_root("Open").unwrap();
/// graph
///     .goto(closed, NamedEvent::new("open"), open)
///     .goto(open, NamedEvent::new("close"), closed)
///     .on_entry(open, |ctx| ctx.after(Duration::from_secs(30), NamedEvent::new("close")));
///
/// let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let mut door = MachineBuilder::new(graph.build_shared())
///     .initial(closed)
///     .clock(start)
///     .build()
///     .unwrap();
///
/// door.raise(NamedEvent::new("open")).unwrap();
/// assert_eq!(door.current_state(), Some(open));
///
/// door.advance(start + chrono::Duration::seconds(30), 10).unwrap();
/// assert_eq!(door.current_state(), Some(closed));
/// assert_eq!(door.next_wake(), None);
/// ```
pub struct StateMachine<M, E: Event> {
    pub(crate) graph: Arc<StateGraph<M, E>>,
    pub(crate) current: Option<StateId>,
    pub(crate) timers: TimerQueue<E>,
    pub(crate) data: M,
    raised: VecDeque<E>,
    listeners: Vec<Listener<E>>,
    history: StateHistory<E>,
    config: MachineConfig,
}

impl<M: MachineData, E: Event> StateMachine<M, E> {
    pub(crate) fn from_parts(
        graph: Arc<StateGraph<M, E>>,
        current: Option<StateId>,
        data: M,
        timers: TimerQueue<E>,
        config: MachineConfig,
    ) -> Self {
        let history = match config.history_limit {
            Some(limit) => StateHistory::bounded(limit),
            None => StateHistory::new(),
        };
        Self {
            graph,
            current,
            timers,
            data,
            raised: VecDeque::new(),
            listeners: Vec::new(),
            history,
            config,
        }
    }

    /// Create an instance with no current state, for the reload path.
    ///
    /// Call [`set_state_by_name`](Self::set_state_by_name) before raising
    /// events.
    pub fn bare(graph: Arc<StateGraph<M, E>>, data: M, clock: DateTime<Utc>) -> Self {
        Self::from_parts(
            graph,
            None,
            data,
            TimerQueue::new(clock),
            MachineConfig::default(),
        )
    }

    /// Replace the runtime configuration. Clears the history if its bound
    /// changes.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        if config.history_limit != self.config.history_limit {
            self.history = match config.history_limit {
                Some(limit) => StateHistory::bounded(limit),
                None => StateHistory::new(),
            };
        }
        self.config = config;
        self
    }

    /// Establish the current state from its name without running any entry
    /// or exit actions.
    pub fn set_state_by_name(&mut self, name: &str) -> Result<StateId, MachineError> {
        let id = self.graph.state(name)?;
        self.current = Some(id);
        Ok(id)
    }

    pub fn graph(&self) -> &Arc<StateGraph<M, E>> {
        &self.graph
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current.map(|id| self.graph.name(id))
    }

    /// Check whether the current state is `state` or lies within it.
    pub fn is_in(&self, state: StateId) -> bool {
        self.current
            .is_some_and(|current| self.graph.is(current, state))
    }

    pub fn data(&self) -> &M {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut M {
        &mut self.data
    }

    pub fn into_data(self) -> M {
        self.data
    }

    pub fn timers(&self) -> &TimerQueue<E> {
        &self.timers
    }

    pub fn history(&self) -> &StateHistory<E> {
        &self.history
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// The instance clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.timers.now()
    }

    /// The instant at which [`advance`](Self::advance) next has work, or
    /// `None` if nothing is scheduled.
    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.timers.next_wake()
    }

    /// Like [`next_wake`](Self::next_wake) with `MAX_UTC` meaning "never".
    pub fn next_wake_or_max(&self) -> DateTime<Utc> {
        self.timers.next_wake_or_max()
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

    /// Cancel every pending schedule of `event`, recurring ones included.
    pub fn cancel(&mut self, event: &E) -> usize {
        self.timers.cancel(event)
    }

    /// Register a listener fired once per committed state change.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&StateChange<E>) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Raise `event` against the current state.
    ///
    /// Events raised by callbacks during this dispatch are processed in
    /// order before this call returns.
    pub fn raise(&mut self, event: E) -> Result<Dispatch<E>, MachineError> {
        if self.current.is_none() {
            return Err(MachineError::NoCurrentState);
        }
        self.raised.push_back(event);

        let result = self.drain_raised();
        if result.is_err() {
            self.raised.clear();
        }
        result
    }

    /// Fire every timer due at or before `now`, at most `max_iterations`
    /// of them.
    ///
    /// Reaching the cap is not an error: [`Advance::backlog`] reports that
    /// due work remains and the caller should advance again.
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        max_iterations: usize,
    ) -> Result<Advance, MachineError> {
        self.timers.set_clock(now);
        if self.current.is_none() && self.timers.is_due(now) {
            return Err(MachineError::NoCurrentState);
        }

        let mut advance = Advance {
            fired: 0,
            changes: 0,
            backlog: false,
        };
        while advance.fired < max_iterations {
            let Some(event) = self.timers.pop_due(now) else {
                break;
            };
            advance.fired += 1;
            debug!(?event, "timer fired");
            advance.changes += self.raise(event)?.changes.len();
        }

        advance.backlog = self.timers.is_due(now);
        if advance.backlog {
            debug!(
                fired = advance.fired,
                next_wake = ?self.timers.next_wake(),
                "iteration cap reached with timers still due"
            );
        }
        Ok(advance)
    }

    /// [`advance`](Self::advance) with the configured iteration cap.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Advance, MachineError> {
        self.advance(now, self.config.max_iterations)
    }

    fn drain_raised(&mut self) -> Result<Dispatch<E>, MachineError> {
        let mut dispatch = Dispatch::empty();
        while let Some(event) = self.raised.pop_front() {
            if dispatch.events >= self.config.max_cascade {
                return Err(MachineError::CascadeLimit {
                    limit: self.config.max_cascade,
                });
            }
            dispatch.events += 1;
            match self.dispatch(event)? {
                Outcome::Ignored => dispatch.ignored += 1,
                Outcome::Stayed => {}
                Outcome::Changed(change) => dispatch.changes.push(change),
            }
        }
        Ok(dispatch)
    }

    fn dispatch(&mut self, event: E) -> Result<Outcome<E>, MachineError> {
        let current = self.current.ok_or(MachineError::NoCurrentState)?;
        let shared = Arc::clone(&self.graph);
        let graph: &StateGraph<M, E> = &shared;

        let Some(handler) = find_handler(graph, current, &event)? else {
            trace!(state = graph.name(current), ?event, "event ignored");
            return Ok(Outcome::Ignored);
        };

        let mut ctx = Context::new(
            graph,
            &mut self.data,
            &mut self.timers,
            &mut self.raised,
            current,
        );
        let next = handler(&mut ctx, current, &event);
        if next.index() >= graph.len() {
            return Err(MachineError::UnknownState {
                name: next.to_string(),
            });
        }
        if next == current {
            trace!(
                state = graph.name(current),
                ?event,
                "event handled in place"
            );
            return Ok(Outcome::Stayed);
        }

        for id in exit_path(graph, current, next) {
            if let Some(exit) = &graph.definition(id).exit {
                exit(&mut ctx);
            }
        }
        for id in entry_path(graph, current, next) {
            if let Some(entry) = &graph.definition(id).entry {
                entry(&mut ctx);
            }
        }

        self.data.before_state_change(current, next);
        self.current = Some(next);
        debug!(
            from = graph.name(current),
            to = graph.name(next),
            ?event,
            "state changed"
        );

        let change = StateChange {
            from: current,
            to: next,
            event,
            at: self.timers.now(),
        };
        self.history.record(StateTransition {
            from: change.from,
            to: change.to,
            event: change.event.clone(),
            timestamp: change.at,
        });
        for listener in &mut self.listeners {
            listener(&change);
        }
        Ok(Outcome::Changed(change))
    }
}

enum Outcome<E> {
    Ignored,
    Stayed,
    Changed(StateChange<E>),
}

impl<M: MachineData + fmt::Debug, E: Event> fmt::Debug for StateMachine<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current_state_name())
            .field("data", &self.data)
            .field("timers", &self.timers)
            .finish()
    }
}
