use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, find_terminator, split_frame, trim_frame, Frame};
use crate::error::FrameError;

/// `tokio_util` codec for newline-delimited frames.
///
/// Decoding follows the same rules as [`crate::Reassembler`]; a trailing
/// unterminated line is yielded as a final frame at end of stream.
#[derive(Debug, Default)]
pub struct LineCodec {
    scanned: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        match find_terminator(src, self.scanned) {
            Some(terminator) => {
                self.scanned = 0;
                Ok(Some(split_frame(src, terminator)))
            }
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        self.scanned = 0;
        let rest = src.split().freeze();
        let trimmed = trim_frame(&rest);
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(Frame::new(trimmed.to_vec())))
    }
}

impl Encoder<Frame> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(frame.as_bytes(), dst)
    }
}
