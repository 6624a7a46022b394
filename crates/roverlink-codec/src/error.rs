use roverlink_frame::FrameError;
use roverlink_schema::{FieldKind, Variant};

/// A frame whose token count does not match the layout. The frame is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unexpected number of values: expected {expected}, got {actual}")]
pub struct FrameFormatError {
    pub expected: usize,
    pub actual: usize,
}

/// A token that is not a valid numeral for its field's kind.
///
/// Advisory: the field decodes as zero and the rest of the frame is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field {index} ({name}) is not a valid {kind}: {token:?}")]
pub struct FieldParseError {
    pub index: usize,
    pub name: &'static str,
    pub kind: FieldKind,
    pub token: String,
}

/// Received and computed checksums disagree.
///
/// Advisory: the snapshot carrying it is still complete and usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("checksum mismatch: calculated checksum = {computed}, received {received}")]
pub struct ChecksumMismatch {
    pub received: i32,
    pub computed: i32,
}

/// Errors that abort building a command frame. Nothing is sent.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// One or more writable fields have no value.
    #[error("command is missing required fields: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    /// A value was supplied for a name outside the command layout.
    #[error("{name:?} is not a command field of {variant}")]
    UnknownField { name: String, variant: Variant },

    /// A value does not fit the field's wire kind.
    #[error("value {value} for {name} does not fit {kind}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        kind: FieldKind,
    },

    /// The serialized command could not be framed.
    #[error("command framing failed: {0}")]
    Frame(#[from] FrameError),
}

/// Result of building or framing a command.
pub type Result<T> = std::result::Result<T, CommandError>;
