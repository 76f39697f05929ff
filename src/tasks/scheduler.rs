//! Delayed-task scheduling
//!
//! The expiring store never sleeps on its own. It asks a [`Scheduler`] to run
//! a callback once a delay has elapsed and keeps the returned [`TimerHandle`]
//! so the timer can be cancelled or replaced per key.

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{CacheError, Result};

/// Callback run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs a callback after a delay.
pub trait Scheduler: Send + Sync + 'static {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

// == Timer Handle ==
/// Cancels its timer when cancelled explicitly or dropped.
///
/// Cancelling a timer whose callback is already running does not interrupt
/// the callback.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancels the timer.
    pub fn cancel(mut self) {
        self.fire_cancel();
    }

    fn fire_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.fire_cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

// == Tokio Scheduler ==
/// Scheduler backed by `tokio::time::sleep` on a runtime handle.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Binds to the runtime the caller is running on.
    pub fn from_current() -> Result<Self> {
        current_runtime().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        let abort = join.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

/// Returns the handle of the runtime the caller is running on.
pub(crate) fn current_runtime() -> Result<Handle> {
    Handle::try_current().map_err(|e| {
        CacheError::Internal(format!("a tokio runtime is required to drive expiry: {e}"))
    })
}
