use roverlink_frame::{Frame, SEPARATOR};
use roverlink_schema::{FrameLayout, Schema};

use crate::checksum::layout_checksum;
use crate::error::{FieldParseError, FrameFormatError};
use crate::snapshot::Snapshot;
use crate::value::FieldValue;

/// Split a frame on single spaces.
///
/// Runs of spaces are not collapsed: `"1  2"` is three tokens, the middle one
/// empty. An empty frame is one empty token.
pub fn tokenize(payload: &[u8]) -> impl Iterator<Item = &[u8]> {
    payload.split(|&b| b == SEPARATOR)
}

/// Decode a telemetry frame against `schema`.
///
/// Fails only when the token count differs from the layout's field count.
/// Unparsable tokens and checksum disagreement are reported on the snapshot.
pub fn decode(frame: &Frame, schema: &Schema) -> Result<Snapshot, FrameFormatError> {
    decode_with_layout(frame, &schema.telemetry)
}

/// Decode a command frame against `schema`, as the controller would.
pub fn decode_command(frame: &Frame, schema: &Schema) -> Result<Snapshot, FrameFormatError> {
    decode_with_layout(frame, &schema.command)
}

/// Decode a frame against an arbitrary layout.
pub fn decode_with_layout(
    frame: &Frame,
    layout: &FrameLayout,
) -> Result<Snapshot, FrameFormatError> {
    let tokens: Vec<&[u8]> = tokenize(frame.as_bytes()).collect();
    if tokens.len() != layout.field_count() {
        return Err(FrameFormatError {
            expected: layout.field_count(),
            actual: tokens.len(),
        });
    }

    let mut values = Vec::with_capacity(tokens.len());
    let mut parse_errors = Vec::new();
    for (field, token) in layout.fields.iter().zip(tokens) {
        let parsed = std::str::from_utf8(token)
            .ok()
            .and_then(|text| FieldValue::parse(field.kind, text));
        match parsed {
            Some(value) => values.push(value),
            None => {
                parse_errors.push(FieldParseError {
                    index: field.index,
                    name: field.name,
                    kind: field.kind,
                    token: String::from_utf8_lossy(token).into_owned(),
                });
                values.push(FieldValue::zero(field.kind));
            }
        }
    }

    let computed = layout_checksum(layout, &values);
    Ok(Snapshot::new(*layout, values, computed, parse_errors))
}
