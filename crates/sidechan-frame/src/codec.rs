use serde_json::Value;

use crate::message::Message;

/// Marker the host runtime prints when a module cannot be resolved at startup.
///
/// Chunks beginning with it are split into lines like structured chunks
/// instead of being wrapped whole as one error.
pub const STARTUP_FAILURE_PREFIX: &str = "\nmodule.js:333";

/// Default number of bytes requested per read: 64 KiB, one pipe delivery.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for reading the side channel.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum bytes delivered as one chunk. Default: 64 KiB.
    pub read_chunk_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// Parse one delivered chunk into the messages it carries.
///
/// Text is decoded lossily. See [`parse_text`] for the classification rules.
pub fn parse_chunk(chunk: &[u8]) -> Vec<Message> {
    parse_text(&String::from_utf8_lossy(chunk))
}

/// Parse one chunk of already-decoded text.
///
/// - Text that is not a candidate JSON stream becomes exactly one synthetic
///   `error` message carrying the whole chunk.
/// - Otherwise the chunk is split on `\n`; empty lines are skipped and lines
///   that do not decode as JSON are dropped.
///
/// An empty chunk carries nothing.
pub fn parse_text(text: &str) -> Vec<Message> {
    if text.is_empty() {
        return Vec::new();
    }
    if !is_candidate_stream(text) {
        tracing::debug!(len = text.len(), "wrapping non-structured chunk as error");
        return vec![Message::error(text)];
    }

    text.split('\n')
        .filter(|line| !line.is_empty())
        .filter_map(decode_line)
        .collect()
}

/// Returns true if the chunk should be split into JSON lines.
pub fn is_candidate_stream(text: &str) -> bool {
    text.starts_with('{') || text.starts_with(STARTUP_FAILURE_PREFIX)
}

/// Decode a single line. Undecodable lines yield `None`.
pub fn decode_line(line: &str) -> Option<Message> {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => Some(Message::from_value(value, line)),
        Err(err) => {
            tracing::trace!(error = %err, len = line.len(), "dropping undecodable line");
            None
        }
    }
}

/// `tokio_util` decoder yielding the messages of each delivered chunk.
///
/// Every call consumes the whole read buffer and restores a full chunk of
/// spare capacity, so one item corresponds to one read from the underlying
/// stream. Use with `FramedRead::with_capacity(.., codec.read_chunk_size())`.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Copy)]
pub struct SideChannelCodec {
    read_chunk_size: usize,
}

#[cfg(feature = "async")]
impl SideChannelCodec {
    pub fn new(config: &ChunkConfig) -> Self {
        Self {
            read_chunk_size: config.read_chunk_size.max(1),
        }
    }

    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }
}

#[cfg(feature = "async")]
impl Default for SideChannelCodec {
    fn default() -> Self {
        Self::new(&ChunkConfig::default())
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for SideChannelCodec {
    type Item = Vec<Message>;
    type Error = crate::error::FrameError;

    fn decode(&mut self, src: &mut bytes::BytesMut) -> crate::error::Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }
        let messages = parse_chunk(&src.split());
        // The next read is bounded by spare capacity; a short buffer would
        // cut a delivery in two.
        src.reserve(self.read_chunk_size);
        Ok(Some(messages))
    }
}
