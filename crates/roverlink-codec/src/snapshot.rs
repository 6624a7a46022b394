use roverlink_schema::{FieldSpec, FrameLayout};

use crate::error::{ChecksumMismatch, FieldParseError};
use crate::value::FieldValue;

/// One decoded frame: a typed value per layout field plus checksum status.
///
/// A snapshot is always complete. Fields whose tokens failed to parse hold
/// the zero of their kind and are listed in [`parse_errors`](Self::parse_errors).
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    layout: FrameLayout,
    values: Vec<FieldValue>,
    computed_checksum: i32,
    parse_errors: Vec<FieldParseError>,
}

/// A decoded controller → console frame.
pub type TelemetrySnapshot = Snapshot;

impl Snapshot {
    pub(crate) fn new(
        layout: FrameLayout,
        values: Vec<FieldValue>,
        computed_checksum: i32,
        parse_errors: Vec<FieldParseError>,
    ) -> Self {
        debug_assert_eq!(values.len(), layout.field_count());
        Self {
            layout,
            values,
            computed_checksum,
            parse_errors,
        }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Value of the field named `name`, or `None` if the layout has no such field.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.layout
            .field(name)
            .and_then(|field| self.values.get(field.index).copied())
    }

    /// Value at a field index.
    pub fn value(&self, index: usize) -> Option<FieldValue> {
        self.values.get(index).copied()
    }

    /// All values in layout order, checksum included.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Fields paired with their values, in layout order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, FieldValue)> + '_ {
        self.layout.fields.iter().zip(self.values.iter().copied())
    }

    /// Checksum value carried by the frame. Zero if its token did not parse.
    pub fn received_checksum(&self) -> i32 {
        self.values
            .get(self.layout.checksum_index())
            .and_then(FieldValue::as_i32)
            .unwrap_or(0)
    }

    pub fn computed_checksum(&self) -> i32 {
        self.computed_checksum
    }

    pub fn checksum_ok(&self) -> bool {
        self.received_checksum() == self.computed_checksum
    }

    /// The mismatch, if the checksums disagree.
    pub fn checksum_mismatch(&self) -> Option<ChecksumMismatch> {
        (!self.checksum_ok()).then(|| ChecksumMismatch {
            received: self.received_checksum(),
            computed: self.computed_checksum,
        })
    }

    pub fn parse_errors(&self) -> &[FieldParseError] {
        &self.parse_errors
    }

    /// Whether every token parsed and the checksum matched.
    pub fn is_clean(&self) -> bool {
        self.parse_errors.is_empty() && self.checksum_ok()
    }
}
