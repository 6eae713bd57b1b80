//! Transition resolution.
//!
//! These functions are pure lookups over a [`StateGraph`]. They decide which
//! rule handles an event and which states must be exited and entered; the
//! machine runs the callbacks in the order they return.

use crate::core::{Event, StateGraph, StateId, TransitionFn};
use crate::machine::MachineError;

/// Find the rule for `event`, starting at `current` and climbing outward.
///
/// Returns `Ok(None)` when no state on the ancestor chain handles the event.
pub(crate) fn find_handler<'g, M, E: Event>(
    graph: &'g StateGraph<M, E>,
    current: StateId,
    event: &E,
) -> Result<Option<&'g TransitionFn<M, E>>, MachineError> {
    let mut chain = graph.ancestry(current);
    for id in chain.by_ref() {
        if let Some(handler) = graph.definition(id).transitions.get(event) {
            return Ok(Some(handler));
        }
    }
    if chain.truncated() {
        return Err(MachineError::AncestryTooDeep {
            state: graph.name(current).to_string(),
            max: graph.max_depth(),
        });
    }
    Ok(None)
}

/// States to exit when moving from `from` to `to`, innermost first.
///
/// Stops at the first ancestor of `from` that `to` lies within, which stays
/// active.
pub(crate) fn exit_path<M, E: Event>(
    graph: &StateGraph<M, E>,
    from: StateId,
    to: StateId,
) -> Vec<StateId> {
    graph
        .ancestry(from)
        .take_while(|&id| !graph.is(to, id))
        .collect()
}

/// States to enter when moving from `from` to `to`, outermost first.
///
/// Ancestors of `to` that were already active are skipped.
pub(crate) fn entry_path<M, E: Event>(
    graph: &StateGraph<M, E>,
    from: StateId,
    to: StateId,
) -> Vec<StateId> {
    let mut path: Vec<StateId> = graph
        .ancestry(to)
        .take_while(|&id| !graph.is(from, id))
        .collect();
    path.reverse();
    path
}
