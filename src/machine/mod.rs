//! Running machine instances.
//!
//! This module is the imperative shell around the static [`crate::core`]
//! graph: it holds the current state, runs entry/exit/transition callbacks
//! and drains the instance's timers.
//!
//! # Key Concepts
//!
//! - **Dispatch**: an event is resolved by climbing from the current state to
//!   its ancestors until a rule is found; unhandled events are ignored
//! - **Ordering**: exits run innermost first up to the common ancestor,
//!   entries run outermost first below it
//! - **Run-to-completion**: events raised from callbacks are queued and
//!   dispatched after the current change commits
//! - **Advance**: due timers fire oldest first, recurring ones catch up one
//!   period per firing, bounded by an iteration cap

mod config;
mod context;
mod error;
#[allow(clippy::module_inception)]
mod machine;
mod shared;
mod transition;

pub use config::{
    MachineConfig, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_CASCADE, DEFAULT_MAX_ITERATIONS,
};
pub use context::Context;
pub use error::MachineError;
pub use machine::{Advance, Dispatch, MachineData, StateChange, StateMachine};
pub use shared::SharedMachine;
