use std::io::Read;

use serde::Serialize;
use sidechan_frame::ChunkReader;
#[cfg(feature = "async")]
use sidechan_frame::ChunkConfig;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::status::StatusSnapshot;

/// Counters for one pumped stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpStats {
    /// Chunks delivered by the stream.
    pub chunks: usize,
    /// Messages dispatched from those chunks.
    pub messages: usize,
}

/// One child invocation: its dispatcher and the lifetime of its output.
#[derive(Debug)]
pub struct Session {
    dispatcher: Dispatcher,
}

impl Session {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn status(&self) -> StatusSnapshot {
        self.dispatcher.status().snapshot()
    }

    /// Dispatch one delivered chunk.
    pub fn feed(&self, chunk: &[u8]) -> usize {
        self.dispatcher.feed(chunk)
    }

    /// Pump a blocking stream until EOF.
    ///
    /// Reading continues after the output has ended so the child never
    /// blocks on a full pipe.
    pub fn pump<R: Read>(&self, reader: &mut ChunkReader<R>) -> Result<PumpStats> {
        let mut stats = PumpStats::default();
        while let Some(chunk) = reader.read_chunk()? {
            stats.chunks += 1;
            stats.messages += self.dispatcher.feed(&chunk);
        }
        tracing::debug!(chunks = stats.chunks, messages = stats.messages, "side channel closed");
        Ok(stats)
    }

    /// Pump an async stream until EOF, reading default-sized chunks.
    #[cfg(feature = "async")]
    pub async fn pump_async<R>(&self, reader: R) -> Result<PumpStats>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        self.pump_async_with_config(reader, &ChunkConfig::default()).await
    }

    /// Pump an async stream until EOF.
    ///
    /// Each read of up to `config.read_chunk_size` bytes is dispatched as one
    /// chunk, matching [`Session::pump`].
    #[cfg(feature = "async")]
    pub async fn pump_async_with_config<R>(
        &self,
        reader: R,
        config: &ChunkConfig,
    ) -> Result<PumpStats>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        use futures_util::StreamExt;
        use sidechan_frame::SideChannelCodec;
        use tokio_util::codec::FramedRead;

        let codec = SideChannelCodec::new(config);
        let mut framed = FramedRead::with_capacity(reader, codec, codec.read_chunk_size());
        let mut stats = PumpStats::default();
        while let Some(messages) = framed.next().await {
            let messages = messages?;
            stats.chunks += 1;
            stats.messages += messages.len();
            for message in messages {
                self.dispatcher.dispatch(message);
            }
        }
        tracing::debug!(chunks = stats.chunks, messages = stats.messages, "side channel closed");
        Ok(stats)
    }

    /// Finish the invocation after its side channel closed.
    ///
    /// Waits for armed termination timers, then ends the output if nothing
    /// has yet.
    pub async fn shutdown(&self) -> StatusSnapshot {
        self.dispatcher.scheduler().drain().await;
        if self.dispatcher.finish() {
            tracing::debug!("output ended on normal completion");
        }
        self.status()
    }

    /// End the invocation now, cancelling armed timers.
    pub fn abort(&self) -> StatusSnapshot {
        self.dispatcher.scheduler().cancel_all();
        self.dispatcher.finish();
        self.status()
    }
}
