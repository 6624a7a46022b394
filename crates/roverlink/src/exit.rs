use std::fmt;
use std::io;

use roverlink_codec::CommandError;
use roverlink_frame::FrameError;
use roverlink_session::SessionError;
use roverlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound
        | io::ErrorKind::PermissionDenied
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) | TransportError::Accept(source) => io_error(context, source),
        TransportError::InvalidAddress(_) | TransportError::UnsupportedBaudRate(_) => {
            CliError::usage(format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn command_error(context: &str, err: CommandError) -> CliError {
    match err {
        CommandError::Incomplete { .. } | CommandError::UnknownField { .. } => {
            CliError::usage(format!("{context}: {err}"))
        }
        CommandError::OutOfRange { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        CommandError::Frame(err) => frame_error(context, err),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Link(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Command(err) => command_error(context, err),
        SessionError::ConfigRead { .. } | SessionError::Config { .. } => {
            CliError::usage(format!("{context}: {err}"))
        }
        SessionError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
