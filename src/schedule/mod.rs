//! Deferred and recurring events.
//!
//! Each machine instance owns a [`TimerQueue`]. The queue never looks at the
//! wall clock: time only moves when the owner advances it, and the single
//! instant at which the queue next needs attention is always available from
//! [`TimerQueue::next_wake`].

mod queue;
mod timer;

pub use queue::TimerQueue;
pub use timer::TimedEvent;
