use std::path::PathBuf;

use roverlink_codec::CommandError;
use roverlink_frame::FrameError;
use roverlink_transport::TransportError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Opening, reading or writing the link failed.
    #[error("link error: {0}")]
    Link(#[from] TransportError),

    /// An outbound frame could not be framed.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// A command could not be built; nothing was sent.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid session configuration.
    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The link reported end of stream.
    #[error("link disconnected")]
    Disconnected,
}

impl From<FrameError> for SessionError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::ConnectionClosed => SessionError::Disconnected,
            FrameError::Io(io) => SessionError::Link(TransportError::Io(io)),
            other => SessionError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
