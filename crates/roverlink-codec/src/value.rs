use std::fmt;

use roverlink_schema::FieldKind;
use serde::Serialize;

/// A decoded field value, typed by its field's kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    I16(i16),
    I32(i32),
    Float(f64),
}

impl FieldValue {
    /// The zero of a kind; substituted for unparsable tokens.
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::I16 => FieldValue::I16(0),
            FieldKind::I32 => FieldValue::I32(0),
            FieldKind::Float => FieldValue::Float(0.0),
        }
    }

    /// Parse a token as `kind`.
    ///
    /// Integers are decimal with an optional sign and must fit the kind's
    /// range. Floats must be finite.
    pub fn parse(kind: FieldKind, token: &str) -> Option<Self> {
        match kind {
            FieldKind::I16 => token.parse().ok().map(FieldValue::I16),
            FieldKind::I32 => token.parse().ok().map(FieldValue::I32),
            FieldKind::Float => token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Float),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::I16(_) => FieldKind::I16,
            FieldValue::I32(_) => FieldKind::I32,
            FieldValue::Float(_) => FieldKind::Float,
        }
    }

    /// Integer value, or `None` for floats.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            FieldValue::I16(v) => Some(i32::from(v)),
            FieldValue::I32(v) => Some(v),
            FieldValue::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            FieldValue::I16(v) => f64::from(v),
            FieldValue::I32(v) => f64::from(v),
            FieldValue::Float(v) => v,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::I32(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v:.4}"),
        }
    }
}
