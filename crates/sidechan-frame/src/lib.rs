//! Chunk parser and wire records for overloaded child-process side channels.
//!
//! A sandboxed child reports back over a single byte stream (its stderr). The
//! stream carries either newline-delimited JSON records:
//!
//! ```text
//! {"type":"log","payload":{"entry":"hello"}}
//! {"type":"error","payload":{"error":"boom","code":"MODULE_NOT_FOUND"}}
//! {"type":"end","payload":{}}
//! ```
//!
//! or, when the child crashes before it can speak the protocol, plain
//! diagnostic text. [`parse_chunk`] turns one delivered chunk into the ordered
//! list of [`Message`]s it carries; plain text becomes a single synthetic
//! `error` message.

pub mod codec;
pub mod error;
pub mod kind;
pub mod message;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::SideChannelCodec;
pub use codec::{
    decode_line, is_candidate_stream, parse_chunk, parse_text, ChunkConfig,
    DEFAULT_READ_CHUNK_SIZE, STARTUP_FAILURE_PREFIX,
};
pub use error::{FrameError, Result};
pub use kind::{MessageKind, END, ERROR, LOG, MODULE_NOT_FOUND};
pub use message::Message;
pub use reader::ChunkReader;
pub use writer::RecordWriter;
