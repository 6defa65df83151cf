//! Error types for reader/writer operations

/// Error raised by a [`Reader`](crate::Reader) or [`Writer`](crate::Writer),
/// or by a schema while driving one
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Input ended in the middle of a field or message
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// The next value does not have the kind the caller asked for
    #[error("Type mismatch at field {field_number}: expected {expected}, found {found}")]
    TypeMismatch {
        field_number: u32,
        expected: &'static str,
        found: &'static str,
    },

    /// A nested message frame was not closed where expected
    #[error("Unbalanced message frame at field {0}")]
    UnbalancedMessage(u32),

    /// The schema of a nested message type could not be created
    #[error("Schema for nested message {message} unavailable: {reason}")]
    NestedSchema {
        message: &'static str,
        reason: String,
    },

    /// Implementation-specific failure
    #[error("{0}")]
    Custom(String),
}
