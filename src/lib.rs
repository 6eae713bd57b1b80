//! Hierarch: hierarchical state machines with a built-in timer scheduler
//!
//! A machine type is described once as an immutable [`StateGraph`]: a forest
//! of named states, each with optional entry/exit actions and a table of
//! event-driven transitions. Running instances share the graph, hold their
//! own current state and domain data, and own a queue of one-shot and
//! recurring timed events driven by a caller-supplied clock.
//!
//! # Core Concepts
//!
//! - **Hierarchy**: events a state does not handle fall back to its
//!   ancestors; exits run innermost first and entries outermost first, only
//!   below the common ancestor
//! - **Identity by definition**: a [`StateId`] rebuilt from a state's name
//!   equals the handle issued when the state was defined
//! - **Timers**: every instance exposes the single instant it next needs
//!   attention, so an external driver can poll only the instances that are
//!   due
//!
//! # Example
//!
//! ```rust
//! use hierarch::builder::{MachineBuilder, StateGraphBuilder};
//! use hierarch::core::NamedEvent;
//! use chrono::{TimeZone, Utc};
//! use std::time::Duration;
//!
//! let mut graph = StateGraphBuilder::<(), NamedEvent>::new();
//! let online = graph.define_root("Online").unwrap();
//! let idle = graph.define_child("Idle", online).unwrap();
//! let busy = graph.define_child("Busy", online).unwrap();
//! let offline = graph.define_root("Offline").unwrap();
//!
//! graph
//!     .goto(idle, NamedEvent::new("work"), busy)
//!     .goto(online, NamedEvent::new("unplug"), offline)
//!     .on_entry(busy, |ctx| ctx.after(Duration::from_secs(5), NamedEvent::new("unplug")));
//!
//! let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
//! let mut machine = MachineBuilder::new(graph.build_shared())
//!     .initial(idle)
//!     .clock(start)
//!     .build()
//!     .unwrap();
//!
//! machine.raise(NamedEvent::new("work")).unwrap();
//! assert!(machine.is_in(online));
//! assert_eq!(machine.next_wake(), Some(start + chrono::Duration::seconds(5)));
//!
//! // "unplug" is inherited from Online.
//! machine.advance(start + chrono::Duration::seconds(5), 10).unwrap();
//! assert_eq!(machine.current_state(), Some(offline));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod machine;
pub mod schedule;

// Re-export commonly used types
pub use crate::builder::{BuildError, DefinitionError, MachineBuilder, StateGraphBuilder};
pub use crate::checkpoint::{Checkpoint, CheckpointError};
pub use crate::core::{Event, NamedEvent, StateGraph, StateId};
pub use crate::machine::{
    Advance, Context, Dispatch, MachineConfig, MachineData, MachineError, SharedMachine,
    StateChange, StateMachine,
};
pub use crate::schedule::{TimedEvent, TimerQueue};
