//! Field and message descriptors
//!
//! A [`MessageDescriptor`] lists the fields of a message type in declaration
//! order. It is built once per type, either by hand through
//! [`MessageDescriptor::builder`] or by `#[derive(Message)]`, and validated
//! before any schema sees it.
//!
//! ```ignore
//! let descriptor = MessageDescriptor::<Person>::builder("Person")
//!     .field(1, "id", FieldType::Int32, direct!(Person, id))
//!     .field(2, "name", FieldType::String, direct!(Person, name))
//!     .message(3, "address", direct!(Person, address))
//!     .field(4, "scores", FieldType::PackedSInt32, direct!(Person, scores))
//!     .build()?;
//! ```

use std::fmt;
use std::mem::size_of;

use protoschema_sdk::{FieldType, MAX_FIELD_NUMBER};

use super::storage::Storage;
use super::Message;
use crate::access::Candidates;
use crate::error::{SchemaError, SchemaResult};

/// One declared field
pub struct FieldDescriptor<M> {
    /// Field number on the wire (`1..=MAX_FIELD_NUMBER`)
    pub number: u32,
    /// Field name, for diagnostics
    pub name: &'static str,
    /// Field type
    pub field_type: FieldType,
    /// Access candidates for the field's storage
    pub storage: Storage<M>,
}

impl<M> fmt::Debug for FieldDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("number", &self.number)
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("storage", &self.storage.kind())
            .finish()
    }
}

/// Validated field layout of a message type
pub struct MessageDescriptor<M> {
    name: &'static str,
    fields: Vec<FieldDescriptor<M>>,
}

impl<M> MessageDescriptor<M> {
    /// Start describing a message
    pub fn builder(name: &'static str) -> DescriptorBuilder<M> {
        DescriptorBuilder {
            name,
            fields: Vec::new(),
            error: None,
        }
    }

    /// Message name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor<M>] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the message declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Split into name and fields
    pub fn into_parts(self) -> (&'static str, Vec<FieldDescriptor<M>>) {
        (self.name, self.fields)
    }
}

impl<M> fmt::Debug for MessageDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`MessageDescriptor`]
pub struct DescriptorBuilder<M> {
    name: &'static str,
    fields: Vec<FieldDescriptor<M>>,
    /// First error seen while adding fields, reported by `build`
    error: Option<SchemaError>,
}

impl<M: 'static> DescriptorBuilder<M> {
    /// Add a scalar, string, bytes or list field
    ///
    /// # Arguments
    /// * `number` - Field number
    /// * `name` - Field name
    /// * `field_type` - Field type; must match the storage
    /// * `storage` - Access candidates, usually from `direct!`, `offset!` or `access!`
    pub fn field(
        mut self,
        number: u32,
        name: &'static str,
        field_type: FieldType,
        storage: impl Into<Storage<M>>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            number,
            name,
            field_type,
            storage: storage.into(),
        });
        self
    }

    /// Add a field whose type is given as a raw tag (see [`FieldType::tag`])
    ///
    /// An unknown tag is reported by [`build`](Self::build) as
    /// [`SchemaError::UnknownFieldType`].
    pub fn field_tag(
        mut self,
        number: u32,
        name: &'static str,
        tag: u8,
        storage: impl Into<Storage<M>>,
    ) -> Self {
        match FieldType::try_from(tag) {
            Ok(field_type) => self.field(number, name, field_type, storage),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e.into());
                }
                self
            }
        }
    }

    /// Add a singular nested message field stored as `Option<Box<N>>`
    pub fn message<N: Message>(
        mut self,
        number: u32,
        name: &'static str,
        storage: Candidates<M, Option<Box<N>>>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            number,
            name,
            field_type: FieldType::Message,
            storage: Storage::Message(Box::new(storage)),
        });
        self
    }

    /// Add a repeated nested message field stored as `Option<Vec<N>>`
    pub fn message_list<N: Message>(
        mut self,
        number: u32,
        name: &'static str,
        storage: Candidates<M, Option<Vec<N>>>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            number,
            name,
            field_type: FieldType::RepeatedMessage,
            storage: Storage::MessageList(Box::new(storage)),
        });
        self
    }

    /// Validate and finish the descriptor
    ///
    /// # Errors
    /// - [`SchemaError::UnknownFieldType`] when a raw tag named no field type
    /// - [`SchemaError::InvalidMessage`] for an empty name, or a zero-sized
    ///   message type that declares fields
    /// - [`SchemaError::InvalidFieldNumber`] for a number outside
    ///   `1..=MAX_FIELD_NUMBER`
    /// - [`SchemaError::DuplicateFieldNumber`] / [`SchemaError::FieldNumberOrder`]
    ///   when numbers do not strictly increase
    /// - [`SchemaError::UnsupportedFieldType`] when the storage cannot hold the type
    pub fn build(self) -> SchemaResult<MessageDescriptor<M>> {
        let message = self.name;

        if let Some(error) = self.error {
            return Err(error);
        }
        if message.is_empty() {
            return Err(SchemaError::InvalidMessage {
                message,
                reason: "message name is empty".to_string(),
            });
        }
        if size_of::<M>() == 0 && !self.fields.is_empty() {
            return Err(SchemaError::InvalidMessage {
                message,
                reason: format!("zero-sized type declares {} fields", self.fields.len()),
            });
        }

        let mut previous: Option<u32> = None;
        for field in &self.fields {
            if field.number == 0 || field.number > MAX_FIELD_NUMBER {
                return Err(SchemaError::InvalidFieldNumber {
                    message,
                    field: field.name,
                    number: field.number,
                });
            }

            match previous {
                Some(prev) if prev == field.number => {
                    return Err(SchemaError::DuplicateFieldNumber {
                        message,
                        number: field.number,
                    });
                }
                Some(prev) if prev > field.number => {
                    return Err(SchemaError::FieldNumberOrder {
                        message,
                        previous: prev,
                        number: field.number,
                    });
                }
                _ => {}
            }
            previous = Some(field.number);

            let kind = field.storage.kind();
            if !kind.accepts(field.field_type) {
                return Err(SchemaError::UnsupportedFieldType {
                    message,
                    field: field.name,
                    field_type: field.field_type,
                    storage: kind.name(),
                });
            }
        }

        Ok(MessageDescriptor {
            name: message,
            fields: self.fields,
        })
    }
}
