//! Field layouts of the roverlink protocol variants.
//!
//! Each [`Schema`] describes, for one controller firmware build, the telemetry
//! frame it sends and the command frame it expects back: field order, field
//! kinds and which integer fields are summed into the trailing checksum.
//!
//! Schemas are static data. Supporting a new firmware build means adding a
//! [`Variant`] and its tables here; the codec is driven entirely by them.

pub mod error;
pub mod field;
pub mod layout;
pub mod registry;

pub use error::{Result, SchemaError};
pub use field::{FieldKind, FieldSpec};
pub use layout::FrameLayout;
pub use registry::{schema_for, Schema, Variant};
