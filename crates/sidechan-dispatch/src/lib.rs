//! Message dispatch, shared status and deferred termination for side-channel
//! sessions.
//!
//! A [`Dispatcher`] owns the policy for one child invocation:
//!
//! - a [`HandlerRegistry`] entry for a message type overrides everything else;
//! - `end` marks the service as finished;
//! - `log` goes to the [`DebugSink`];
//! - `error` (and any unknown or untyped message) is written to the
//!   [`Output`]. Fatal dependency errors end the output at once; other errors
//!   end it after a quiet window so trailing stack lines still get through.
//!
//! All paths that end the output go through [`Status::try_end`], so `end` is
//! called at most once per invocation.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod output;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod status;

pub use config::{DispatchConfig, TerminationMode, DEFAULT_QUIET_WINDOW};
pub use dispatcher::{Dispatcher, Disposition, MissingDependencyHook};
pub use error::{Result, SessionError};
pub use output::{
    DebugSink, GuardedOutput, MemoryOutput, NullOutput, Output, OutputEvent, TracingDebugSink,
    WriterOutput,
};
pub use registry::{Handler, HandlerRegistry};
pub use scheduler::TerminationScheduler;
pub use session::{PumpStats, Session};
pub use status::{Status, StatusSnapshot};
