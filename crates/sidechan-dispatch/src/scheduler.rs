use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::TerminationMode;
use crate::output::Output;
use crate::status::Status;

/// Ends the output once a quiet window has passed after a generic error.
///
/// The window is measured from the error's arrival. At fire time the timer
/// claims [`Status::try_end`]; if anything else ended the output first the
/// timer does nothing.
pub struct TerminationScheduler {
    quiet_window: Duration,
    mode: TerminationMode,
    runtime: Option<Handle>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl TerminationScheduler {
    /// Create a scheduler bound to the current tokio runtime, if any.
    pub fn new(quiet_window: Duration, mode: TerminationMode) -> Self {
        Self::with_runtime(quiet_window, mode, Handle::try_current().ok())
    }

    /// Create a scheduler that spawns its timers on `runtime`.
    pub fn with_runtime(
        quiet_window: Duration,
        mode: TerminationMode,
        runtime: Option<Handle>,
    ) -> Self {
        Self {
            quiet_window,
            mode,
            runtime,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    pub fn mode(&self) -> TerminationMode {
        self.mode
    }

    /// Runtime the timers are bound to, if one was found or given.
    pub fn runtime(&self) -> Option<&Handle> {
        self.runtime.as_ref()
    }

    /// Arm a timer that ends `output` after the quiet window.
    ///
    /// Without a runtime to host the timer the output is ended immediately.
    pub fn arm(&self, status: Arc<Status>, output: Arc<dyn Output>) {
        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                tracing::warn!("no tokio runtime for termination timer, ending output now");
                if status.try_end() {
                    output.end();
                }
                return;
            }
        };

        let deadline = Instant::now() + self.quiet_window;
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if status.try_end() {
                tracing::debug!("quiet window elapsed, ending output");
                output.end();
            } else {
                tracing::trace!("quiet window elapsed, output already ended");
            }
        });

        let mut pending = self.lock_pending();
        pending.retain(|task| !task.is_finished());
        if self.mode == TerminationMode::Rearm {
            for previous in pending.drain(..) {
                previous.abort();
            }
        }
        pending.push(task);
    }

    /// Number of armed timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.lock_pending()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Abort every armed timer.
    pub fn cancel_all(&self) {
        for task in self.lock_pending().drain(..) {
            task.abort();
        }
    }

    /// Wait until every armed timer has fired or been cancelled.
    pub async fn drain(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.lock_pending());
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                // Cancelled timers report a JoinError; nothing to do for them.
                let _ = task.await;
            }
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TerminationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationScheduler")
            .field("quiet_window", &self.quiet_window)
            .field("mode", &self.mode)
            .field("pending", &self.pending())
            .finish()
    }
}
