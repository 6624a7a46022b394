use std::fmt;

/// Wire representation of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Decimal integer in `i16` range (`%hd` on the controller).
    I16,
    /// Decimal integer in `i32` range (`%ld` on the controller).
    I32,
    /// Decimal float (`%.4f` on the controller).
    Float,
}

impl FieldKind {
    /// Whether values of this kind can take part in the checksum.
    pub fn is_integer(self) -> bool {
        matches!(self, FieldKind::I16 | FieldKind::I32)
    }

    /// Wrap a 32-bit accumulator to this kind's width (two's complement).
    ///
    /// Floats have no width of their own; the value is returned unchanged.
    pub fn wrap(self, value: i32) -> i32 {
        match self {
            FieldKind::I16 => i32::from(value as i16),
            FieldKind::I32 | FieldKind::Float => value,
        }
    }

    /// Whether `value` is representable in this kind without wrapping.
    pub fn fits(self, value: i64) -> bool {
        match self {
            FieldKind::I16 => i16::try_from(value).is_ok(),
            FieldKind::I32 => i32::try_from(value).is_ok(),
            FieldKind::Float => true,
        }
    }

    /// Short name used in listings.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::I16 => "i16",
            FieldKind::I32 => "i32",
            FieldKind::Float => "float",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position, semantic name and kind of one field in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub index: usize,
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(index: usize, name: &'static str, kind: FieldKind) -> Self {
        Self { index, name, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_truncates_to_i16() {
        assert_eq!(FieldKind::I16.wrap(3006), 3006);
        assert_eq!(FieldKind::I16.wrap(32_768), -32_768);
        assert_eq!(FieldKind::I16.wrap(70_000), 4_464);
        assert_eq!(FieldKind::I32.wrap(70_000), 70_000);
    }

    #[test]
    fn fits_checks_range() {
        assert!(FieldKind::I16.fits(-32_768));
        assert!(!FieldKind::I16.fits(32_768));
        assert!(FieldKind::I32.fits(2_147_483_647));
        assert!(!FieldKind::I32.fits(2_147_483_648));
    }

    #[test]
    fn only_integers_are_summable() {
        assert!(FieldKind::I16.is_integer());
        assert!(FieldKind::I32.is_integer());
        assert!(!FieldKind::Float.is_integer());
    }
}
