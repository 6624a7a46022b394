//! Newline-delimited framing for the roverlink serial protocol.
//!
//! The controller and the console exchange ASCII lines:
//! - fields separated by exactly one space
//! - each frame terminated by `\n`
//! - an optional trailing `\r` and surrounding whitespace ignored
//!
//! The [`Reassembler`] turns arbitrary read chunks into frames; readers,
//! writers and the async [`LineCodec`] are built on the same primitives.

pub mod codec;
pub mod error;
#[cfg(feature = "async")]
pub mod line_codec;
pub mod reader;
pub mod reassembler;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, find_terminator, trim_frame, Frame, FrameConfig,
    DEFAULT_READ_CHUNK, SEPARATOR, TERMINATOR,
};
pub use error::{FrameError, Result};
#[cfg(feature = "async")]
pub use line_codec::LineCodec;
pub use reader::FrameReader;
pub use reassembler::Reassembler;
pub use writer::FrameWriter;
