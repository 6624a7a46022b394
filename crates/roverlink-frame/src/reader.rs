use std::io::{ErrorKind, Read};

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reassembler::Reassembler;

/// Reads complete frames from any `Read` stream.
///
/// Partial reads are buffered internally; callers only see complete frames.
pub struct FrameReader<T> {
    inner: T,
    reassembler: Reassembler,
    chunk: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            reassembler: Reassembler::new(),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at end of stream; bytes after
    /// the last terminator stay available through [`FrameReader::take_partial`].
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.reassembler.next_frame() {
                return Ok(frame);
            }
            if self.fill()? == 0 {
                return Err(FrameError::ConnectionClosed);
            }
        }
    }

    /// Take unterminated trailing bytes as a final frame.
    pub fn take_partial(&mut self) -> Option<Frame> {
        self.reassembler.take_partial()
    }

    fn fill(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => {
                    self.reassembler.append(&self.chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
