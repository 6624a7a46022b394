/// Errors that can occur while reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An outbound payload contains the frame terminator.
    #[error("payload contains a frame terminator at byte {position}")]
    EmbeddedTerminator { position: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed.
    #[error("link closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
