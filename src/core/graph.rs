//! The state definition registry.
//!
//! A `StateGraph` is the immutable, shared description of one kind of state
//! machine: every named state, its parent, its entry/exit actions and its
//! transition table. It is assembled once with a
//! [`StateGraphBuilder`](crate::builder::StateGraphBuilder) and then shared
//! by `Arc` between all instances of that machine type.

use super::event::Event;
use super::state::StateId;
use crate::machine::{Context, MachineError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default ceiling on how deep a state may be nested.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Side effect run when a state is entered or exited.
pub type Action<M, E> = Arc<dyn Fn(&mut Context<'_, M, E>) + Send + Sync>;

/// Transition function: `(machine, current state, event) -> next state`.
///
/// Returning the current state handles the event without leaving the state.
pub type TransitionFn<M, E> =
    Arc<dyn Fn(&mut Context<'_, M, E>, StateId, &E) -> StateId + Send + Sync>;

/// Static description of a single named state.
pub struct StateDefinition<M, E: Event> {
    pub(crate) name: String,
    pub(crate) parent: Option<StateId>,
    pub(crate) depth: usize,
    pub(crate) entry: Option<Action<M, E>>,
    pub(crate) exit: Option<Action<M, E>>,
    pub(crate) transitions: HashMap<E, TransitionFn<M, E>>,
}

impl<M, E: Event> StateDefinition<M, E> {
    pub(crate) fn new(name: String, parent: Option<StateId>, depth: usize) -> Self {
        Self {
            name,
            parent,
            depth,
            entry: None,
            exit: None,
            transitions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Number of ancestors above this state. Roots have depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check whether this definition itself declares a rule for `event`.
    /// Inherited rules are not considered.
    pub fn handles(&self, event: &E) -> bool {
        self.transitions.contains_key(event)
    }

    pub fn has_entry(&self) -> bool {
        self.entry.is_some()
    }

    pub fn has_exit(&self) -> bool {
        self.exit.is_some()
    }
}

impl<M, E: Event> fmt::Debug for StateDefinition<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("depth", &self.depth)
            .field("events", &self.transitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable forest of state definitions.
///
/// # Panics
///
/// Methods taking a [`StateId`] panic if the handle was issued by a different
/// graph with fewer states.
pub struct StateGraph<M, E: Event> {
    pub(crate) definitions: Vec<StateDefinition<M, E>>,
    pub(crate) index: HashMap<String, StateId>,
    pub(crate) max_depth: usize,
}

impl<M, E: Event> StateGraph<M, E> {
    pub(crate) fn definition(&self, id: StateId) -> &StateDefinition<M, E> {
        &self.definitions[id.index()]
    }

    /// Get the public view of a definition.
    pub fn get(&self, id: StateId) -> &StateDefinition<M, E> {
        self.definition(id)
    }

    /// Reconstruct a handle from a state name.
    ///
    /// The returned handle equals the one issued when the state was defined.
    pub fn lookup(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// Like [`lookup`](Self::lookup), but reports unknown names as an error.
    pub fn state(&self, name: &str) -> Result<StateId, MachineError> {
        self.lookup(name).ok_or_else(|| MachineError::UnknownState {
            name: name.to_string(),
        })
    }

    pub fn name(&self, id: StateId) -> &str {
        &self.definition(id).name
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.definition(id).parent
    }

    pub fn depth(&self, id: StateId) -> usize {
        self.definition(id).depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Iterate `id` followed by each of its ancestors, innermost first.
    ///
    /// The walk yields at most `max_depth + 1` states. A longer chain can only
    /// come from corrupted parent links; [`Ancestry::truncated`] reports it.
    pub fn ancestry(&self, id: StateId) -> Ancestry<'_, M, E> {
        Ancestry {
            graph: self,
            next: Some(id),
            remaining: self.max_depth.saturating_add(1),
        }
    }

    /// Hierarchical "is-a": true when `a == b` or `b` is an ancestor of `a`.
    pub fn is(&self, a: StateId, b: StateId) -> bool {
        self.ancestry(a).any(|id| id == b)
    }

    /// All handles, in definition order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.definitions.len()).map(StateId::from_index)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<M, E: Event> fmt::Debug for StateGraph<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGraph")
            .field("definitions", &self.definitions)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Iterator over a state and its ancestors, innermost first.
pub struct Ancestry<'g, M, E: Event> {
    graph: &'g StateGraph<M, E>,
    next: Option<StateId>,
    remaining: usize,
}

impl<M, E: Event> Ancestry<'_, M, E> {
    /// True once the walk stopped at the depth ceiling with ancestors left.
    pub fn truncated(&self) -> bool {
        self.remaining == 0 && self.next.is_some()
    }
}

impl<M, E: Event> Iterator for Ancestry<'_, M, E> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.graph.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::StateGraphBuilder;
    use crate::core::NamedEvent;

    fn sample() -> (
        crate::core::StateGraph<(), NamedEvent>,
        [crate::core::StateId; 5],
    ) {
        let mut builder = StateGraphBuilder::<(), NamedEvent>::new();
        let root = builder.define_root("Root").unwrap();
        let left = builder.define_child("Left", root).unwrap();
        let left_leaf = builder.define_child("LeftLeaf", left).unwrap();
        let right = builder.define_child("Right", root).unwrap();
        let other = builder.define_root("Other").unwrap();
        let graph = builder.build();
        (graph, [root, left, left_leaf, right, other])
    }

    #[test]
    fn ancestry_walks_innermost_first() {
        let (graph, [root, left, left_leaf, _, _]) = sample();

        let chain: Vec<_> = graph.ancestry(left_leaf).collect();
        assert_eq!(chain, vec![left_leaf, left, root]);
    }

    #[test]
    fn is_holds_for_self_and_ancestors_only() {
        let (graph, [root, left, left_leaf, right, other]) = sample();

        assert!(graph.is(left_leaf, left_leaf));
        assert!(graph.is(left_leaf, left));
        assert!(graph.is(left_leaf, root));
        assert!(!graph.is(left_leaf, right));
        assert!(!graph.is(left, left_leaf));
        assert!(!graph.is(left_leaf, other));
    }

    #[test]
    fn lookup_reconstructs_equal_handle() {
        let (graph, [_, left, _, _, _]) = sample();

        let rebuilt = graph.lookup("Left").unwrap();
        assert_eq!(rebuilt, left);
        assert_eq!(graph.name(rebuilt), "Left");
        assert!(graph.lookup("Missing").is_none());
        assert!(graph.state("Missing").is_err());
    }

    #[test]
    fn depth_counts_ancestors() {
        let (graph, [root, left, left_leaf, _, other]) = sample();

        assert_eq!(graph.depth(root), 0);
        assert_eq!(graph.depth(left), 1);
        assert_eq!(graph.depth(left_leaf), 2);
        assert_eq!(graph.depth(other), 0);
        assert_eq!(graph.len(), 5);
    }
}
