//! Output and debug capabilities.
//!
//! The dispatcher never frames or transmits anything itself; it calls
//! `write`/`end` on an [`Output`] and forwards log entries to a [`DebugSink`].

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::status::Status;

/// Client-facing output of one invocation.
pub trait Output: Send + Sync {
    /// Append text to the response.
    fn write(&self, text: &str);

    /// Close the response.
    fn end(&self);
}

/// Receives `log` entries emitted by the child.
pub trait DebugSink: Send + Sync {
    fn debug(&self, entry: &Value);
}

impl<F> DebugSink for F
where
    F: Fn(&Value) + Send + Sync,
{
    fn debug(&self, entry: &Value) {
        self(entry)
    }
}

/// Forwards log entries as `tracing` events under the `sidechan::child` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDebugSink;

impl DebugSink for TracingDebugSink {
    fn debug(&self, entry: &Value) {
        match entry {
            Value::String(text) => tracing::info!(target: "sidechan::child", "{text}"),
            other => tracing::info!(target: "sidechan::child", entry = %other),
        }
    }
}

/// Output used when the embedder supplied none. Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl Output for NullOutput {
    fn write(&self, _text: &str) {}

    fn end(&self) {}
}

/// View of an output that honours [`Status::ended`].
///
/// Handed to embedder handlers: writes after the output ended are dropped and
/// `end` reaches the inner output at most once across the whole invocation.
pub struct GuardedOutput<'a> {
    inner: &'a dyn Output,
    status: &'a Status,
}

impl<'a> GuardedOutput<'a> {
    pub fn new(inner: &'a dyn Output, status: &'a Status) -> Self {
        Self { inner, status }
    }
}

impl Output for GuardedOutput<'_> {
    fn write(&self, text: &str) {
        if self.status.ended() {
            tracing::trace!(len = text.len(), "dropping write after output ended");
            return;
        }
        self.inner.write(text);
    }

    fn end(&self) {
        if self.status.try_end() {
            self.inner.end();
        }
    }
}

/// One call observed by a [`MemoryOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Write(String),
    End,
}

/// Output that records every call in memory.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    events: Mutex<Vec<OutputEvent>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls in the order they happened.
    pub fn events(&self) -> Vec<OutputEvent> {
        self.lock().clone()
    }

    /// Concatenation of every written text.
    pub fn written(&self) -> String {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Write(text) => Some(text.as_str()),
                OutputEvent::End => None,
            })
            .collect()
    }

    /// Number of `end` calls received.
    pub fn end_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, OutputEvent::End))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OutputEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Output for MemoryOutput {
    fn write(&self, text: &str) {
        self.lock().push(OutputEvent::Write(text.to_owned()));
    }

    fn end(&self) {
        self.lock().push(OutputEvent::End);
    }
}

/// Output backed by any `Write` stream. `end` flushes.
///
/// Write failures are logged and otherwise ignored; the response is
/// best-effort.
pub struct WriterOutput<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterOutput<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Consume the output and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Output for WriterOutput<W> {
    fn write(&self, text: &str) {
        let mut inner = self.lock();
        if let Err(err) = inner.write_all(text.as_bytes()).and_then(|()| inner.flush()) {
            tracing::warn!(error = %err, "failed writing to output");
        }
    }

    fn end(&self) {
        if let Err(err) = self.lock().flush() {
            tracing::warn!(error = %err, "failed flushing output");
        }
    }
}
