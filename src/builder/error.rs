//! Errors raised while defining state graphs and building machines.

use thiserror::Error;

/// Configuration errors in a state graph definition.
///
/// These indicate a bug in the machine author's setup code and are never
/// expected at runtime.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("State '{name}' is already defined")]
    DuplicateState { name: String },

    #[error("State '{name}' names parent '{parent}', which is not defined yet")]
    UnknownParent { name: String, parent: String },

    #[error("State '{name}' would be nested deeper than the limit of {max}")]
    DepthExceeded { name: String, max: usize },
}

/// Errors that can occur when building a machine instance.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial state '{name}' is not defined in the state graph")]
    UnknownInitialState { name: String },
}
