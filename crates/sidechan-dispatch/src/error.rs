/// Errors that can occur while pumping a side channel into a session.
///
/// Dispatch itself never fails; only reading the stream does.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading the side channel failed.
    #[error("side channel error: {0}")]
    Frame(#[from] sidechan_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
