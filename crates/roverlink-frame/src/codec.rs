use std::borrow::Cow;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame terminator.
pub const TERMINATOR: u8 = b'\n';

/// Field separator inside a frame.
pub const SEPARATOR: u8 = b' ';

/// Default number of bytes requested from the link per read.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// One protocol message with its terminator removed and whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Create a frame from raw payload bytes.
    ///
    /// The payload is stored as given; use [`trim_frame`] first when it comes
    /// straight off the wire.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Frame contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame contents as text, replacing invalid UTF-8 sequences.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Length of the frame contents in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the frame is zero-length.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes this frame occupies on the wire, terminator included.
    pub fn wire_size(&self) -> usize {
        self.bytes.len() + 1
    }

    /// Consume the frame, returning its contents.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<&'static str> for Frame {
    fn from(text: &'static str) -> Self {
        Frame::new(Bytes::from_static(text.as_bytes()))
    }
}

/// Strip an optional trailing carriage return and surrounding ASCII whitespace.
pub fn trim_frame(line: &[u8]) -> &[u8] {
    let (start, end) = trim_bounds(line);
    &line[start..end]
}

fn trim_bounds(line: &[u8]) -> (usize, usize) {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |idx| idx + 1);
    let start = line[..end]
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(end);
    (start, end)
}

/// Position of the first terminator at or after `from`.
pub fn find_terminator(src: &[u8], from: usize) -> Option<usize> {
    src.get(from..)?
        .iter()
        .position(|&b| b == TERMINATOR)
        .map(|idx| from + idx)
}

/// Split off everything up to and including the terminator at `terminator`,
/// returning the trimmed frame before it.
pub(crate) fn split_frame(src: &mut BytesMut, terminator: usize) -> Frame {
    let line = src.split_to(terminator + 1).freeze();
    let (start, end) = trim_bounds(&line[..terminator]);
    Frame::new(line.slice(start..end))
}

/// Decode one frame from the front of `src`.
///
/// Returns `None` if `src` holds no terminator yet. On success the frame and
/// its terminator are consumed from `src`.
pub fn decode_frame(src: &mut BytesMut) -> Option<Frame> {
    let terminator = find_terminator(src, 0)?;
    Some(split_frame(src, terminator))
}

/// Encode a payload into the wire format: payload bytes followed by `\n`.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────────────┬──────┐
/// │ fields, one space apart (ASCII)  │ '\n' │
/// └──────────────────────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if let Some(position) = find_terminator(payload, 0) {
        return Err(FrameError::EmbeddedTerminator { position });
    }
    dst.reserve(payload.len() + 1);
    dst.put_slice(payload);
    dst.put_u8(TERMINATOR);
    Ok(())
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Bytes requested from the link per read. Default: 1 KiB.
    pub read_chunk_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
