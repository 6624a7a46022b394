//! Protocol stack for serial-linked robot controllers.
//!
//! roverlink decodes the space-separated telemetry lines a controller streams
//! over its link, checks their additive checksums, estimates the arrival rate
//! and encodes command lines to send back.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte links (serial tty, TCP, Unix sockets)
//! - [`frame`]: newline framing and chunk reassembly
//! - [`schema`]: field layouts of each protocol variant
//! - [`codec`]: telemetry decoding and command encoding
//! - [`session`]: stateful sessions over a link (behind the `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use roverlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use roverlink_frame::*;
}

/// Re-export schema types.
pub mod schema {
    pub use roverlink_schema::*;
}

/// Re-export codec types.
pub mod codec {
    pub use roverlink_codec::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use roverlink_session::*;
}
