//! Demultiplex the overloaded stderr side channel of sandboxed child processes.
//!
//! A sandboxed child reports logs, completion and errors as JSON lines on its
//! stderr, but a crash before the protocol starts leaves plain stack traces
//! on the same stream. sidechan turns that stream into typed messages and
//! drives the client response accordingly.
//!
//! # Crate Structure
//!
//! - [`frame`]: Chunk parser, message model and the child-side record writer
//! - [`dispatch`]: Dispatcher, shared status, output capabilities and the
//!   deferred termination scheduler

/// Re-export frame types.
pub mod frame {
    pub use sidechan_frame::*;
}

/// Re-export dispatch types.
pub mod dispatch {
    pub use sidechan_dispatch::*;
}
