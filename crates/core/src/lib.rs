//! protoschema - Core Schema Engine
//!
//! This crate turns a message type's field layout into a schema that writes
//! the message to a [`Writer`] and merges it back from a [`Reader`].
//!
//! # Modules
//!
//! - [`schema`] - Descriptors, field tables, the runtime, compiled and
//!   specialized schemas, and the per-type registry
//! - [`access`] - Direct and offset field access, and the policy choosing between them
//! - [`config`] - TOML-backed settings read by the registry
//! - [`tape`] - In-memory reader/writer pair
//! - [`logging`] - Subscriber setup for hosts without one
//!
//! # Re-exports
//!
//! The [`sdk`] crate is re-exported for field types and the reader/writer traits.

// Allow the crate to refer to itself as `protoschema_core` for proc macro compatibility
extern crate self as protoschema_core;

pub use protoschema_sdk as sdk;

pub mod access;
pub mod config;
pub mod error;
pub mod logging;
pub mod schema;
pub mod tape;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use sdk::{
    DispatchShape, FieldType, Reader, ScalarKind, WireError, Writer, MAX_FIELD_NUMBER, READ_DONE,
};

pub use access::{AccessPolicy, AccessStrategy, Candidates, FieldAccessor};
pub use error::{SchemaError, SchemaResult};
pub use schema::{
    create_schema, CompiledSchema, DescriptorBuilder, Message, MessageDescriptor, RuntimeSchema,
    Schema, Specialized, SpecializedSchema,
};
pub use tape::{TapeReader, TapeWriter, WireEvent, WireValue};

// Re-export config types
pub use config::{CodeShape, ConfigError, ConfigResult, SchemaConfig, Strategy};

// Re-export macros
pub use protoschema_macros::Message;
