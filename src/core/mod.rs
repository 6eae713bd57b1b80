//! Core types of the hierarchical state machine.
//!
//! This module contains the static side of a machine:
//! - Event identity via the `Event` trait
//! - `StateId` handles and the `StateGraph` definition registry
//! - Transition history
//!
//! Nothing in here runs callbacks; dispatch lives in [`crate::machine`].

mod event;
mod graph;
mod history;
mod state;

pub use event::{Event, NamedEvent};
pub use graph::{Action, Ancestry, StateDefinition, StateGraph, TransitionFn, DEFAULT_MAX_DEPTH};
pub use history::{StateHistory, StateTransition};
pub use state::StateId;
