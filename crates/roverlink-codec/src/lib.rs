//! Telemetry decoding and command encoding for roverlink frames.
//!
//! Decoding is lenient: a frame with the right number of tokens always yields
//! a complete [`Snapshot`], with unparsable fields zeroed and checksum
//! disagreement reported alongside. Only a wrong token count rejects a frame.
//!
//! Encoding is strict: [`encode`] refuses to build a command unless every
//! writable field has an in-range value.
//!
//! ```
//! use roverlink_codec::{decode_command, encode, CommandValues};
//! use roverlink_frame::Frame;
//! use roverlink_schema::{schema_for, Variant};
//!
//! let schema = schema_for(Variant::Legacy21);
//! let values = CommandValues::zeroed(&schema.command).with("rightDesiredRpm", 120);
//! let wire = encode(&values, schema).unwrap();
//!
//! let echoed = decode_command(&Frame::new(wire.slice(..wire.len() - 1)), schema).unwrap();
//! assert!(echoed.checksum_ok());
//! ```

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod snapshot;
pub mod value;

pub use checksum::{checksum, layout_checksum};
pub use decoder::{decode, decode_command, decode_with_layout, tokenize};
pub use encoder::{build_command, encode, CommandFrame, CommandValues};
pub use error::{ChecksumMismatch, CommandError, FieldParseError, FrameFormatError, Result};
pub use snapshot::{Snapshot, TelemetrySnapshot};
pub use value::FieldValue;

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use roverlink_frame::Frame;
    use roverlink_schema::{schema_for, Variant};

    use super::*;

    fn variant() -> impl Strategy<Value = Variant> {
        prop_oneof![Just(Variant::Legacy21), Just(Variant::Extended25)]
    }

    proptest! {
        #[test]
        fn encoded_commands_decode_to_the_same_values(
            variant in variant(),
            raw in proptest::collection::vec(any::<i16>(), 12),
        ) {
            let schema = schema_for(variant);
            let values: CommandValues = schema
                .command
                .value_fields()
                .iter()
                .zip(&raw)
                .map(|(field, value)| (field.name, i64::from(*value)))
                .collect();

            let frame = build_command(&values, schema).unwrap();
            let decoded = decode_command(&frame.to_frame(), schema).unwrap();

            prop_assert!(decoded.is_clean());
            for field in schema.command.value_fields() {
                let value = decoded.get(field.name).and_then(|v| v.as_i32()).unwrap();
                prop_assert_eq!(i64::from(value), values.get(field.name).unwrap());
            }
        }

        #[test]
        fn checksum_ignores_order_of_summed_fields(
            raw in proptest::collection::vec(any::<i16>(), 17),
            seed in any::<u64>(),
        ) {
            let mut shuffled: Vec<i32> = raw.iter().copied().map(i32::from).collect();
            let len = shuffled.len();
            for i in 0..len {
                let j = (seed.rotate_left(i as u32) as usize) % len;
                shuffled.swap(i, j);
            }
            let width = roverlink_schema::FieldKind::I16;
            prop_assert_eq!(
                checksum(raw.iter().copied().map(i32::from), width),
                checksum(shuffled, width)
            );
        }

        #[test]
        fn decode_never_panics(text in "[ 0-9.a-z-]{0,120}") {
            for variant in Variant::ALL {
                if let Ok(snapshot) = decode(&Frame::new(text.clone()), schema_for(variant)) {
                    prop_assert_eq!(snapshot.values().len(), schema_for(variant).field_count());
                }
            }
        }
    }
}
