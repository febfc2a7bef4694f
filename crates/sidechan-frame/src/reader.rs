use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::codec::{parse_chunk, ChunkConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;

/// Reads delivered chunks from any `Read` stream.
///
/// Each successful `read` on the inner stream is one chunk. Chunk boundaries
/// are whatever the transport delivers; no buffering across reads happens.
pub struct ChunkReader<T> {
    inner: T,
    buf: Vec<u8>,
    config: ChunkConfig,
}

impl<T: Read> ChunkReader<T> {
    /// Create a new chunk reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk reader with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            buf: vec![0u8; config.read_chunk_size.max(1)],
            config,
        }
    }

    /// Read the next chunk (blocking).
    ///
    /// Returns `Ok(None)` when EOF is reached.
    pub fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(Bytes::copy_from_slice(&self.buf[..n]))),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Read the next chunk and parse it.
    ///
    /// Returns `Ok(None)` when EOF is reached. A chunk may parse to an empty
    /// list.
    pub fn read_messages(&mut self) -> Result<Option<Vec<Message>>> {
        Ok(self.read_chunk()?.map(|chunk| parse_chunk(&chunk)))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current chunk reader configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }
}
