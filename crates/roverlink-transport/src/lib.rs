//! Byte links between the operator console and the robot controller.
//!
//! Provides a unified [`LinkStream`] over the ways a controller is reached:
//! - Serial ports configured 8N1 (via `serialport`)
//! - TCP bridges
//! - Unix domain sockets (Unix)
//!
//! This is the lowest layer of roverlink. It moves bytes and reports I/O
//! failures; it knows nothing about frames.

pub mod address;
pub mod config;
pub mod error;
pub mod serial;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use address::LinkAddress;
pub use config::SerialConfig;
pub use error::{Result, TransportError};
pub use serial::SerialStream;
pub use traits::LinkStream;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
