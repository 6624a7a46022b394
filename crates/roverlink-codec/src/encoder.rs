use std::collections::BTreeMap;
use std::iter;

use bytes::{Bytes, BytesMut};
use roverlink_frame::{encode_frame, Frame};
use roverlink_schema::{FrameLayout, Schema};
use serde::{Deserialize, Serialize};

use crate::checksum::checksum;
use crate::error::{CommandError, Result};

/// Named values for the writable fields of a command frame.
///
/// Serializes as a plain `{ "name": value }` map so it can be stored in
/// session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandValues {
    values: BTreeMap<String, i64>,
}

impl CommandValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every writable field of `layout` set to zero.
    pub fn zeroed(layout: &FrameLayout) -> Self {
        layout
            .value_fields()
            .iter()
            .map(|field| (field.name.to_string(), 0))
            .collect()
    }

    pub fn set(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: i64) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<i64> {
        self.values.remove(name)
    }

    /// Overlay `other` onto `self`; values in `other` win.
    pub fn merge(&mut self, other: &CommandValues) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for CommandValues {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// A validated command, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    values: Vec<i32>,
    checksum: i32,
    payload: Bytes,
}

impl CommandFrame {
    /// Writable field values in layout order, checksum excluded.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn checksum(&self) -> i32 {
        self.checksum
    }

    /// Space-separated text without the terminator.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(self.payload.clone())
    }

    /// Payload followed by the line terminator.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.payload.len() + 1);
        encode_frame(&self.payload, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// Validate `values` against the command layout of `schema` and compute the
/// checksum.
///
/// Every writable field must be present, every name must belong to the
/// layout and every value must fit its field.
pub fn build_command(values: &CommandValues, schema: &Schema) -> Result<CommandFrame> {
    let layout = &schema.command;

    let missing: Vec<&'static str> = layout
        .value_fields()
        .iter()
        .filter(|field| values.get(field.name).is_none())
        .map(|field| field.name)
        .collect();
    if !missing.is_empty() {
        return Err(CommandError::Incomplete { missing });
    }

    let checksum_name = layout.checksum_field().name;
    if let Some((name, _)) = values
        .iter()
        .find(|(name, _)| *name == checksum_name || layout.field(name).is_none())
    {
        return Err(CommandError::UnknownField {
            name: name.to_string(),
            variant: schema.variant,
        });
    }

    let mut ordered = Vec::with_capacity(layout.checksum_index());
    for field in layout.value_fields() {
        let value = values.get(field.name).unwrap_or_default();
        let narrowed = i32::try_from(value)
            .ok()
            .filter(|_| field.kind.fits(value));
        let Some(narrowed) = narrowed else {
            return Err(CommandError::OutOfRange {
                name: field.name,
                value,
                kind: field.kind,
            });
        };
        ordered.push(narrowed);
    }

    let sum = checksum(
        layout.checksum_fields.iter().map(|&index| ordered[index]),
        layout.checksum_field().kind,
    );

    let text = ordered
        .iter()
        .map(ToString::to_string)
        .chain(iter::once(sum.to_string()))
        .collect::<Vec<_>>()
        .join(" ");

    Ok(CommandFrame {
        values: ordered,
        checksum: sum,
        payload: Bytes::from(text),
    })
}

/// Encode `values` as a newline-terminated command frame.
pub fn encode(values: &CommandValues, schema: &Schema) -> Result<Bytes> {
    build_command(values, schema)?.to_wire()
}

#[cfg(test)]
mod tests {
    use roverlink_schema::{schema_for, FieldKind, Variant};

    use super::*;

    fn legacy_stop() -> CommandValues {
        CommandValues::zeroed(&schema_for(Variant::Legacy21).command)
    }

    #[test]
    fn encodes_legacy_command() {
        let values = legacy_stop()
            .with("rightDesiredRpm", 100)
            .with("leftDesiredRpm", -40)
            .with("gpio3", 1);
        let wire = encode(&values, schema_for(Variant::Legacy21)).unwrap();
        assert_eq!(&wire[..], b"100 -40 0 0 0 1 0 0 0 0 0 61\n");
    }

    #[test]
    fn encodes_extended_command() {
        let schema = schema_for(Variant::Extended25);
        let values = CommandValues::zeroed(&schema.command)
            .with("led2", 1)
            .with("emergencyShutdown", 1);
        let frame = build_command(&values, schema).unwrap();
        assert_eq!(frame.values().len(), 12);
        assert_eq!(frame.checksum(), 2);
        assert_eq!(frame.payload(), b"0 0 0 1 0 0 0 0 0 0 0 1 2");
    }

    #[test]
    fn missing_fields_are_listed() {
        let values = CommandValues::new().with("rightDesiredRpm", 1);
        let err = build_command(&values, schema_for(Variant::Legacy21)).unwrap_err();
        match err {
            CommandError::Incomplete { missing } => {
                assert_eq!(missing.len(), 10);
                assert_eq!(missing[0], "leftDesiredRpm");
                assert!(!missing.contains(&"checksum"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_and_checksum_names_are_rejected() {
        let schema = schema_for(Variant::Legacy21);
        let err = build_command(&legacy_stop().with("led1", 1), schema).unwrap_err();
        assert!(matches!(err, CommandError::UnknownField { ref name, .. } if name == "led1"));

        let err = build_command(&legacy_stop().with("checksum", 7), schema).unwrap_err();
        assert!(matches!(err, CommandError::UnknownField { ref name, .. } if name == "checksum"));
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        let values = legacy_stop().with("rightDesiredRpm", 40_000);
        let err = build_command(&values, schema_for(Variant::Legacy21)).unwrap_err();
        assert!(matches!(
            err,
            CommandError::OutOfRange {
                name: "rightDesiredRpm",
                value: 40_000,
                kind: FieldKind::I16
            }
        ));
    }

    #[test]
    fn checksum_wraps_like_the_controller() {
        let values = legacy_stop()
            .with("rightDesiredRpm", 30_000)
            .with("leftDesiredRpm", 30_000);
        let frame = build_command(&values, schema_for(Variant::Legacy21)).unwrap();
        assert_eq!(frame.checksum(), -5_536);
    }

    #[test]
    fn merge_overrides_existing_values() {
        let mut base = legacy_stop();
        base.merge(&CommandValues::new().with("estop", 1));
        assert_eq!(base.get("estop"), Some(1));
        assert_eq!(base.len(), 11);
    }

    #[test]
    fn command_values_deserialize_from_map() {
        let values: CommandValues =
            serde_json::from_str(r#"{"rightDesiredRpm": 5, "leftDesiredRpm": -5}"#).unwrap();
        assert_eq!(values.get("leftDesiredRpm"), Some(-5));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn frame_round_trips_through_wire() {
        let frame = build_command(&legacy_stop(), schema_for(Variant::Legacy21)).unwrap();
        let wire = frame.to_wire().unwrap();
        assert_eq!(&wire[..wire.len() - 1], frame.payload());
        assert_eq!(frame.to_frame().as_bytes(), frame.payload());
    }
}
