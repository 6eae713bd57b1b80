//! Lightweight state handles.
//!
//! A `StateId` is an index into the arena of definitions owned by a
//! [`StateGraph`](super::StateGraph). Handles compare by definition identity:
//! the handle returned when a state is defined and the handle reconstructed
//! later from the state's name are equal because both index the same slot.

use std::fmt;

/// Handle to a state definition inside a [`StateGraph`](super::StateGraph).
///
/// Handles are only meaningful for the graph that issued them. The serialized
/// form of a state is its name, never its index; use
/// [`StateGraph::name`](super::StateGraph::name) and
/// [`StateGraph::lookup`](super::StateGraph::lookup) to convert.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct StateId(u32);

impl StateId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the definition in its graph, in definition order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
