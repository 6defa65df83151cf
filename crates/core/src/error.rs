//! Schema construction errors

use protoschema_sdk::{FieldType, UnknownFieldType};

/// Error raised while building a schema
///
/// All variants are fatal for the schema being built; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Two fields share a field number
    #[error("{message}: duplicate field number {number}")]
    DuplicateFieldNumber { message: &'static str, number: u32 },

    /// A field number is lower than the one declared before it
    #[error("{message}: field number {number} declared after {previous} (numbers must increase)")]
    FieldNumberOrder {
        message: &'static str,
        previous: u32,
        number: u32,
    },

    /// Field number outside `1..=MAX_FIELD_NUMBER`
    #[error("{message}.{field}: invalid field number {number}")]
    InvalidFieldNumber {
        message: &'static str,
        field: &'static str,
        number: u32,
    },

    /// The field's storage cannot hold values of its declared type
    #[error("{message}.{field}: {field_type} cannot be stored in {storage} storage")]
    UnsupportedFieldType {
        message: &'static str,
        field: &'static str,
        field_type: FieldType,
        storage: &'static str,
    },

    /// A raw field type tag did not name a field type
    #[error(transparent)]
    UnknownFieldType(#[from] UnknownFieldType),

    /// No access strategy can reach the field
    #[error("{message}.{field}: field is not accessible (no direct accessor, offset access unavailable)")]
    AccessDenied {
        message: &'static str,
        field: &'static str,
    },

    /// The message type itself cannot carry a schema
    #[error("{message}: invalid message type: {reason}")]
    InvalidMessage { message: &'static str, reason: String },
}

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;
