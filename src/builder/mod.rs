//! Builder API for state graphs and machine instances.
//!
//! [`StateGraphBuilder`] is the definition-time API: declare states parents
//! first, then attach entry/exit actions and transition rules.
//! [`MachineBuilder`] creates fresh instances over a finished graph.

pub mod error;
pub mod graph;
pub mod machine;

pub use error::{BuildError, DefinitionError};
pub use graph::StateGraphBuilder;
pub use machine::MachineBuilder;
