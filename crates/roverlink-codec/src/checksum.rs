use roverlink_schema::{FieldKind, FrameLayout};

use crate::value::FieldValue;

/// Additive checksum: wrapping 32-bit sum, wrapped again to `width`.
pub fn checksum(values: impl IntoIterator<Item = i32>, width: FieldKind) -> i32 {
    width.wrap(values.into_iter().fold(0i32, i32::wrapping_add))
}

/// Checksum of `values` laid out per `layout`, summing the layout's checksum
/// fields in index order.
///
/// `values` must hold one entry per layout field (the checksum slot's content
/// is ignored).
pub fn layout_checksum(layout: &FrameLayout, values: &[FieldValue]) -> i32 {
    let summed = layout
        .checksum_fields
        .iter()
        .filter_map(|&index| values.get(index).and_then(FieldValue::as_i32));
    checksum(summed, layout.checksum_field().kind)
}
