//! Builder for state graphs.

use crate::builder::error::DefinitionError;
use crate::core::{Event, StateDefinition, StateGraph, StateId, DEFAULT_MAX_DEPTH};
use crate::machine::Context;
use std::collections::HashMap;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for the definition-time API.
///
/// States are defined parents-first; a parent is referenced by the handle
/// returned when it was defined, so a state can never name a parent that
/// does not exist yet. Behavior is attached afterwards, one definition at a
/// time.
///
/// # Panics
///
/// The attachers (`on_entry`, `on_exit`, `on_event`, `goto`) panic if the
/// handle was issued by a different builder with fewer states.
///
/// # Example
///
/// ```rust
/// use hierarch::builder::StateGraphBuilder;
/// use hierarch::core::NamedEvent;
///
/// let mut builder = StateGraphBuilder::<(), NamedEvent>::new();
/// let powered = builder.define_root("Powered").unwrap();
/// let idle = builder.define_child("Idle", powered).unwrap();
/// let running = builder.define_child("Running", powered).unwrap();
///
/// builder
///     .goto(idle, NamedEvent::new("start"), running)
///     .goto(running, NamedEvent::new("stop"), idle);
///
/// let graph = builder.build();
/// assert!(graph.is(running, powered));
/// ```
pub struct StateGraphBuilder<M, E: Event> {
    definitions: Vec<StateDefinition<M, E>>,
    index: HashMap<String, StateId>,
    max_depth: usize,
}

impl<M: 'static, E: Event> StateGraphBuilder<M, E> {
    /// Create an empty builder with the default depth ceiling.
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            index: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the nesting ceiling. States deeper than this are rejected.
    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Register a state under `parent`, or as a root when `parent` is `None`.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        parent: Option<StateId>,
    ) -> Result<StateId, DefinitionError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(DefinitionError::DuplicateState { name });
        }

        let depth = match parent {
            None => 0,
            Some(parent) => match self.definitions.get(parent.index()) {
                Some(definition) => definition.depth() + 1,
                None => {
                    return Err(DefinitionError::UnknownParent {
                        name,
                        parent: parent.to_string(),
                    })
                }
            },
        };
        if depth > self.max_depth {
            return Err(DefinitionError::DepthExceeded {
                name,
                max: self.max_depth,
            });
        }

        let id = StateId::from_index(self.definitions.len());
        self.index.insert(name.clone(), id);
        self.definitions
            .push(StateDefinition::new(name, parent, depth));
        Ok(id)
    }

    pub fn define_root(&mut self, name: impl Into<String>) -> Result<StateId, DefinitionError> {
        self.define(name, None)
    }

    pub fn define_child(
        &mut self,
        name: impl Into<String>,
        parent: StateId,
    ) -> Result<StateId, DefinitionError> {
        self.define(name, Some(parent))
    }

    /// Declare a whole outline of `(name, parent name)` pairs in order.
    ///
    /// Every entry is attempted and ALL problems are reported together,
    /// rather than stopping at the first bad line. Entries whose parent
    /// failed to define are reported as unknown-parent errors as well.
    pub fn declare_all<'a, I>(
        &mut self,
        outline: I,
    ) -> Validation<Vec<StateId>, NonEmptyVec<DefinitionError>>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut checks: Vec<Validation<StateId, NonEmptyVec<DefinitionError>>> = Vec::new();

        for (name, parent_name) in outline {
            let parent = match parent_name {
                None => Ok(None),
                Some(parent_name) => self
                    .index
                    .get(parent_name)
                    .copied()
                    .map(Some)
                    .ok_or_else(|| DefinitionError::UnknownParent {
                        name: name.to_string(),
                        parent: parent_name.to_string(),
                    }),
            };

            let check = match parent.and_then(|parent| self.define(name, parent)) {
                Ok(id) => Validation::success(id),
                Err(error) => Validation::fail(error),
            };
            checks.push(check);
        }

        Validation::all_vec(checks)
    }

    /// Handle of an already defined state.
    pub fn lookup(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// # Panics
    ///
    /// Panics if `id` is out of range for this builder.
    fn definition_mut(&mut self, id: StateId) -> &mut StateDefinition<M, E> {
        &mut self.definitions[id.index()]
    }

    /// Attach (or replace) the entry action of `state`.
    pub fn on_entry<F>(&mut self, state: StateId, action: F) -> &mut Self
    where
        F: Fn(&mut Context<'_, M, E>) + Send + Sync + 'static,
    {
        self.definition_mut(state).entry = Some(Arc::new(action));
        self
    }

    /// Attach (or replace) the exit action of `state`.
    pub fn on_exit<F>(&mut self, state: StateId, action: F) -> &mut Self
    where
        F: Fn(&mut Context<'_, M, E>) + Send + Sync + 'static,
    {
        self.definition_mut(state).exit = Some(Arc::new(action));
        self
    }

    /// Attach (or replace) the transition rule of `state` for `event`.
    ///
    /// The handler decides the next state at dispatch time. Returning the
    /// current state consumes the event without any entry/exit actions.
    pub fn on_event<F>(&mut self, state: StateId, event: E, handler: F) -> &mut Self
    where
        F: Fn(&mut Context<'_, M, E>, StateId, &E) -> StateId + Send + Sync + 'static,
    {
        self.definition_mut(state)
            .transitions
            .insert(event, Arc::new(handler));
        self
    }

    /// Attach an unconditional transition from `state` to `target` on `event`.
    pub fn goto(&mut self, state: StateId, event: E, target: StateId) -> &mut Self {
        self.on_event(state, event, move |_, _, _| target)
    }

    pub fn build(self) -> StateGraph<M, E> {
        StateGraph {
            definitions: self.definitions,
            index: self.index,
            max_depth: self.max_depth,
        }
    }

    /// Build and wrap in an `Arc`, ready to share between instances.
    pub fn build_shared(self) -> Arc<StateGraph<M, E>> {
        Arc::new(self.build())
    }
}

impl<M: 'static, E: Event> Default for StateGraphBuilder<M, E> {
    fn default() -> Self {
        Self::new()
    }
}
