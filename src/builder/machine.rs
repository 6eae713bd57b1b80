//! Builder for constructing machine instances.

use crate::builder::error::BuildError;
use crate::core::{Event, StateGraph, StateId};
use crate::machine::{MachineConfig, MachineData, StateMachine};
use crate::schedule::TimerQueue;
use chrono::{DateTime, Utc};
use std::sync::Arc;

enum Initial {
    Id(StateId),
    Named(String),
}

/// Builder for fresh machine instances with a fluent API.
///
/// Construction never runs entry actions; the initial state is simply
/// current from the start.
pub struct MachineBuilder<M, E: Event> {
    graph: Arc<StateGraph<M, E>>,
    initial: Option<Initial>,
    data: Option<M>,
    clock: Option<DateTime<Utc>>,
    config: MachineConfig,
}

impl<M: MachineData, E: Event> MachineBuilder<M, E> {
    /// Create a new builder for instances of `graph`.
    pub fn new(graph: Arc<StateGraph<M, E>>) -> Self {
        Self {
            graph,
            initial: None,
            data: None,
            clock: None,
            config: MachineConfig::default(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: StateId) -> Self {
        self.initial = Some(Initial::Id(state));
        self
    }

    /// Set the initial state by name (required, unless `initial` is used).
    pub fn initial_named(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(Initial::Named(name.into()));
        self
    }

    /// Set the domain data used by [`build`](Self::build).
    pub fn data(mut self, data: M) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the instance clock. Defaults to the current wall time.
    pub fn clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the instance, using `M::default()` if no data was supplied.
    /// Returns an error if the initial state is missing or not in the graph.
    pub fn build(mut self) -> Result<StateMachine<M, E>, BuildError>
    where
        M: Default,
    {
        let data = self.data.take().unwrap_or_default();
        self.build_with(data)
    }

    /// Build the instance around `data`, for types without a default.
    pub fn build_with(self, data: M) -> Result<StateMachine<M, E>, BuildError> {
        let initial = match self.initial.ok_or(BuildError::MissingInitialState)? {
            Initial::Id(id) if id.index() < self.graph.len() => id,
            Initial::Id(id) => {
                return Err(BuildError::UnknownInitialState {
                    name: id.to_string(),
                })
            }
            Initial::Named(name) => self
                .graph
                .lookup(&name)
                .ok_or(BuildError::UnknownInitialState { name })?,
        };

        let clock = self.clock.unwrap_or_else(Utc::now);
        Ok(StateMachine::from_parts(
            self.graph,
            Some(initial),
            data,
            TimerQueue::new(clock),
            self.config,
        ))
    }
}
