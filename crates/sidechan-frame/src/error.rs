/// Errors that can occur while reading or writing the side channel.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred on the underlying stream.
    #[error("side-channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized to JSON.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The stream stopped accepting bytes before a record was fully written.
    #[error("side channel closed (incomplete record)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
