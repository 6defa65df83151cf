//! Schema Engine - Field-driven message serialization
//!
//! A [`Schema`] walks the fields of a message in two directions: `write_to`
//! emits every non-default field to a [`Writer`], `merge_from` pulls fields
//! from a [`Reader`] until it reports [`READ_DONE`](protoschema_sdk::READ_DONE).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  MessageDescriptor (builder or #[derive(Message)])          │
//! │    number, name, FieldType, Storage (access candidates)     │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │ validate, resolve access
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  FieldTable: FieldRecord { FieldKey, Slot } + FieldMap       │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//! ┌──────────────────────────────┐ ┌──────────────────────────────┐
//! │ RuntimeSchema                │ │ CompiledSchema               │
//! │   match per field per call   │ │   boxed per-field closures   │
//! └──────────────────────────────┘ └──────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SpecializedSchema: code emitted by #[derive(Message)]      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All three produce the same writer calls and the same merged state for a
//! given message. Schemas are immutable, `Send + Sync`, and shared via `Arc`.
//!
//! # Usage
//!
//! ```ignore
//! use protoschema_core::{Message, TapeWriter};
//!
//! #[derive(Default, Message)]
//! struct Ping {
//!     #[proto(field = 1, kind = "uint64")]
//!     sequence: u64,
//! }
//!
//! let schema = Ping::schema()?;
//! let mut tape = TapeWriter::new();
//! schema.write_to(&Ping { sequence: 7 }, &mut tape)?;
//! ```

pub mod compiled;
pub mod descriptor;
pub mod field_map;
pub mod nested;
pub mod registry;
pub mod runtime;
pub mod specialized;
pub mod storage;
pub mod table;

use std::sync::Arc;

use protoschema_sdk::{Reader, WireError, Writer};

use crate::config::{SchemaConfig, Strategy};
use crate::error::SchemaResult;

pub use compiled::CompiledSchema;
pub use descriptor::{DescriptorBuilder, FieldDescriptor, MessageDescriptor};
pub use field_map::FieldMap;
pub use registry::{cache_size, clear_cache};
pub use runtime::RuntimeSchema;
pub use specialized::{Specialized, SpecializedSchema};
pub use storage::{Slot, Storage, StorageKind};
pub use table::{FieldKey, FieldRecord, FieldTable};

/// A message type the schema engine can serialize
///
/// Usually implemented by `#[derive(Message)]`.
pub trait Message: Default + 'static {
    /// Describe the fields of this type
    fn descriptor() -> SchemaResult<MessageDescriptor<Self>>;

    /// Schema over generated code, if the type has any
    ///
    /// `#[derive(Message)]` returns a [`SpecializedSchema`]. The registry uses
    /// it under [`Strategy::Specialized`].
    fn specialized_schema() -> Option<Arc<dyn Schema<Self>>> {
        None
    }

    /// Shared schema for this type, built on first use
    fn schema() -> SchemaResult<Arc<dyn Schema<Self>>> {
        registry::schema::<Self>()
    }
}

/// Serializes and deserializes messages of type `M`
pub trait Schema<M>: Send + Sync {
    /// Name of the message type
    fn message_name(&self) -> &'static str;

    /// Write every non-default field of `message`
    fn write_to(&self, message: &M, writer: &mut dyn Writer) -> Result<(), WireError>;

    /// Merge fields from `reader` into `message` until the reader is done
    ///
    /// Scalars are overwritten, lists are appended to and nested messages are
    /// merged into. Unknown fields are skipped.
    fn merge_from(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError>;
}

/// Create a schema for a descriptor under the given configuration
///
/// A descriptor carries no generated code, so [`Strategy::Specialized`] builds
/// a [`RuntimeSchema`] here.
///
/// # Errors
/// [`SchemaError::AccessDenied`](crate::SchemaError::AccessDenied) when a field
/// cannot be reached under the configured access policy.
pub fn create_schema<M: 'static>(
    descriptor: MessageDescriptor<M>,
    config: &SchemaConfig,
) -> SchemaResult<Arc<dyn Schema<M>>> {
    let policy = config.access_policy();

    let schema: Arc<dyn Schema<M>> = match config.strategy {
        Strategy::Generic | Strategy::Specialized => {
            Arc::new(RuntimeSchema::new(descriptor, &policy)?)
        }
        Strategy::Compiled => Arc::new(CompiledSchema::new(descriptor, &policy, config.code_shape)?),
    };
    Ok(schema)
}

/// Whether a scalar holds its type's default (and is therefore not written)
#[inline]
pub fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}
