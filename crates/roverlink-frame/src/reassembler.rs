use bytes::BytesMut;
use tracing::trace;

use crate::codec::{find_terminator, split_frame, trim_frame, Frame};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Turns an append-only byte stream into newline-delimited frames.
///
/// Bytes are kept in arrival order and leave the buffer only as part of a
/// complete frame (or through [`Reassembler::clear`]). Chunk boundaries have no
/// effect on the frames produced.
#[derive(Debug)]
pub struct Reassembler {
    buf: BytesMut,
    // Bytes before this offset are known to contain no terminator.
    scanned: usize,
}

impl Reassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
        }
    }

    /// Append bytes received from the link.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Frame> {
        match find_terminator(&self.buf, self.scanned) {
            Some(terminator) => {
                self.scanned = 0;
                let frame = split_frame(&mut self.buf, terminator);
                trace!(len = frame.len(), pending = self.buf.len(), "reassembled frame");
                Some(frame)
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Extract every complete frame currently buffered, in arrival order.
    ///
    /// Zero-length frames are returned like any other; rejecting them is the
    /// decoder's job.
    pub fn drain_frames(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame() {
            frames.push(frame);
        }
        frames
    }

    /// Take whatever follows the last terminator as a final frame.
    ///
    /// Intended for end-of-input (a capture file without a trailing newline).
    /// Returns `None` when nothing but whitespace is pending.
    pub fn take_partial(&mut self) -> Option<Frame> {
        let pending = self.buf.split().freeze();
        self.scanned = 0;
        if trim_frame(&pending).is_empty() {
            return None;
        }
        Some(Frame::new(trim_frame(&pending).to_vec()))
    }

    /// Number of bytes waiting for a terminator.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no bytes are pending.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard all pending bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
