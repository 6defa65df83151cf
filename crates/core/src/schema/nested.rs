//! Nested message fields
//!
//! A message field delegates to the schema of the nested type. That schema is
//! looked up through the registry the first time the field is written or
//! merged, then kept in a per-field `OnceLock`, so building a schema never
//! recurses into the schemas of its children (self-referencing types work).

use std::any::type_name;
use std::sync::{Arc, OnceLock};

use protoschema_sdk::{Reader, WireError, Writer};

use super::{Message, Schema};
use crate::access::{Access, AccessPolicy, AccessStrategy, Candidates, FieldAccessor};
use crate::error::SchemaResult;

/// Message field whose accessor has not been chosen yet
pub trait PendingMessage<M>: Send + Sync {
    /// Choose the accessor and produce the field handler
    fn resolve(
        self: Box<Self>,
        policy: &AccessPolicy,
        message: &'static str,
        field: &'static str,
    ) -> SchemaResult<Box<dyn MessageField<M>>>;
}

/// Writes and merges one nested-message field of `M`
pub trait MessageField<M>: Send + Sync {
    /// Name of the nested message type
    fn nested_name(&self) -> &'static str;

    /// Access strategy used for the field
    fn strategy(&self) -> AccessStrategy;

    /// Write the field; nothing is written when it is absent
    fn write(&self, message: &M, number: u32, writer: &mut dyn Writer) -> Result<(), WireError>;

    /// Merge one occurrence of the field from the reader
    fn merge(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError>;
}

/// Lazily resolved schema of a nested type
struct NestedSchema<N> {
    schema: OnceLock<Arc<dyn Schema<N>>>,
}

impl<N: Message> NestedSchema<N> {
    fn new() -> Self {
        Self {
            schema: OnceLock::new(),
        }
    }

    fn get(&self) -> Result<&Arc<dyn Schema<N>>, WireError> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema);
        }

        let schema = N::schema().map_err(|e| WireError::NestedSchema {
            message: type_name::<N>(),
            reason: e.to_string(),
        })?;
        Ok(self.schema.get_or_init(|| schema))
    }
}

/// Singular nested message stored as `Option<Box<N>>`
pub struct SingularMessage<M, N> {
    access: Access<M, Option<Box<N>>>,
    schema: NestedSchema<N>,
}

/// Repeated nested message stored as `Option<Vec<N>>`
pub struct RepeatedMessage<M, N> {
    access: Access<M, Option<Vec<N>>>,
    schema: NestedSchema<N>,
}

impl<M: 'static, N: Message> PendingMessage<M> for Candidates<M, Option<Box<N>>> {
    fn resolve(
        self: Box<Self>,
        policy: &AccessPolicy,
        message: &'static str,
        field: &'static str,
    ) -> SchemaResult<Box<dyn MessageField<M>>> {
        Ok(Box::new(SingularMessage {
            access: (*self).resolve(policy, message, field)?,
            schema: NestedSchema::new(),
        }))
    }
}

impl<M: 'static, N: Message> PendingMessage<M> for Candidates<M, Option<Vec<N>>> {
    fn resolve(
        self: Box<Self>,
        policy: &AccessPolicy,
        message: &'static str,
        field: &'static str,
    ) -> SchemaResult<Box<dyn MessageField<M>>> {
        Ok(Box::new(RepeatedMessage {
            access: (*self).resolve(policy, message, field)?,
            schema: NestedSchema::new(),
        }))
    }
}

impl<M: 'static, N: Message> MessageField<M> for SingularMessage<M, N> {
    fn nested_name(&self) -> &'static str {
        type_name::<N>()
    }

    fn strategy(&self) -> AccessStrategy {
        self.access.strategy()
    }

    fn write(&self, message: &M, number: u32, writer: &mut dyn Writer) -> Result<(), WireError> {
        let Some(child) = self.access.get(message) else {
            return Ok(());
        };
        let schema = self.schema.get()?;
        writer.write_message(number, &mut |w: &mut dyn Writer| schema.write_to(child, w))
    }

    fn merge(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError> {
        let schema = self.schema.get()?;
        let child = self.access.get_mut(message).get_or_insert_with(Box::default);
        reader.read_message(&mut |r: &mut dyn Reader| schema.merge_from(child, r))
    }
}

impl<M: 'static, N: Message> MessageField<M> for RepeatedMessage<M, N> {
    fn nested_name(&self) -> &'static str {
        type_name::<N>()
    }

    fn strategy(&self) -> AccessStrategy {
        self.access.strategy()
    }

    fn write(&self, message: &M, number: u32, writer: &mut dyn Writer) -> Result<(), WireError> {
        let Some(items) = self.access.get(message) else {
            return Ok(());
        };
        if items.is_empty() {
            return Ok(());
        }

        let schema = self.schema.get()?;
        for item in items {
            writer.write_message(number, &mut |w: &mut dyn Writer| schema.write_to(item, w))?;
        }
        Ok(())
    }

    fn merge(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError> {
        let schema = self.schema.get()?;
        let mut item = N::default();
        reader.read_message(&mut |r: &mut dyn Reader| schema.merge_from(&mut item, r))?;
        self.access
            .get_mut(message)
            .get_or_insert_with(Vec::new)
            .push(item);
        Ok(())
    }
}
