//! Event identity.
//!
//! Events carry no behavior. They are compared by their domain value, so two
//! separately constructed events with the same identifying value are the same
//! event for dispatch and cancellation purposes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Trait for values that can be raised against a state machine.
///
/// Blanket-implemented for every type with the required bounds, so plain
/// enums work out of the box:
///
/// ```rust
/// use hierarch::core::Event;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum DoorEvent {
///     Open,
///     Close,
/// }
///
/// fn takes_event<E: Event>(_: E) {}
/// takes_event(DoorEvent::Open);
/// ```
pub trait Event:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Event for T where
    T: Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// An event identified only by its name.
///
/// Serializes as the bare name string.
///
/// ```rust
/// use hierarch::core::NamedEvent;
///
/// let a = NamedEvent::new("timeout");
/// let b = NamedEvent::from("timeout");
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "timeout");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedEvent(String);

impl NamedEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NamedEvent {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NamedEvent {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Display for NamedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
