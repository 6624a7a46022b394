use std::path::PathBuf;

/// Errors raised by the byte link to the controller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial device could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The serial device was opened but line settings could not be applied.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to a network or socket endpoint.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// Failed to bind a local socket.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on an open link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested baud rate is not one the controller runs at.
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// The link address string could not be parsed.
    #[error("invalid link address: {0}")]
    InvalidAddress(String),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The link kind is not available on this platform.
    #[error("{0} links are not supported on this platform")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, TransportError>;
