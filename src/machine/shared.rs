//! Thread-shareable machine handle.

use crate::core::{Event, StateId};
use crate::machine::machine::{Advance, Dispatch, MachineData, StateMachine};
use crate::machine::MachineError;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;

/// A machine instance behind one per-instance lock.
///
/// Every operation holds the lock for its whole duration, callbacks
/// included. Callbacks reach the scheduler through their
/// [`Context`](super::Context), never through this handle, so the lock is
/// never taken twice on one thread. Distinct instances do not contend.
///
/// The lock only guards in-process access; keeping two processes from
/// advancing the same persisted instance is the driver's job.
pub struct SharedMachine<M, E: Event> {
    inner: Arc<Mutex<StateMachine<M, E>>>,
}

impl<M, E: Event> Clone for SharedMachine<M, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: MachineData, E: Event> SharedMachine<M, E> {
    pub fn new(machine: StateMachine<M, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(machine)),
        }
    }

    /// Lock the instance for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, StateMachine<M, E>> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the instance.
    pub fn with<R>(&self, f: impl FnOnce(&mut StateMachine<M, E>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn raise(&self, event: E) -> Result<Dispatch<E>, MachineError> {
        self.inner.lock().raise(event)
    }

    pub fn advance(
        &self,
        now: DateTime<Utc>,
        max_iterations: usize,
    ) -> Result<Advance, MachineError> {
        self.inner.lock().advance(now, max_iterations)
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Result<Advance, MachineError> {
        self.inner.lock().tick(now)
    }

    pub fn at(&self, due: DateTime<Utc>, event: E) {
        self.inner.lock().at(due, event);
    }

    pub fn after(&self, delay: Duration, event: E) {
        self.inner.lock().after(delay, event);
    }

    pub fn every(&self, interval: Duration, event: E) {
        self.inner.lock().every(interval, event);
    }

    pub fn cancel(&self, event: &E) -> usize {
        self.inner.lock().cancel(event)
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.inner.lock().current_state()
    }

    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().next_wake()
    }

    /// Unwrap the instance if this is the last handle.
    pub fn try_unwrap(self) -> Result<StateMachine<M, E>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
