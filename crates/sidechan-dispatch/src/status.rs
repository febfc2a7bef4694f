use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Shared state of one child invocation.
///
/// Three independent, monotonic flags. `ended` is claimed through
/// [`Status::try_end`] so that exactly one caller ever ends the output.
#[derive(Debug, Default)]
pub struct Status {
    service_ended: AtomicBool,
    erroring: AtomicBool,
    ended: AtomicBool,
}

/// Point-in-time copy of a [`Status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub service_ended: bool,
    pub erroring: bool,
    pub ended: bool,
}

impl Status {
    /// Create a status with all flags cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a status ready to be shared with dispatchers and timers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The child signalled logical completion.
    pub fn service_ended(&self) -> bool {
        self.service_ended.load(Ordering::SeqCst)
    }

    /// An error message has been observed.
    pub fn erroring(&self) -> bool {
        self.erroring.load(Ordering::SeqCst)
    }

    /// The output has been (or is being) ended.
    pub fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn mark_service_ended(&self) {
        self.service_ended.store(true, Ordering::SeqCst);
    }

    pub fn mark_erroring(&self) {
        self.erroring.store(true, Ordering::SeqCst);
    }

    /// Claim the right to end the output.
    ///
    /// Returns true for exactly one caller; every later call returns false.
    pub fn try_end(&self) -> bool {
        !self.ended.swap(true, Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            service_ended: self.service_ended(),
            erroring: self.erroring(),
            ended: self.ended(),
        }
    }
}
