/// Errors that can occur when selecting a protocol schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The name does not match any known protocol variant.
    #[error("unknown protocol variant {0:?} (expected legacy-21 or extended-25)")]
    UnknownVariant(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
