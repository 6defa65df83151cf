//! Generic schema engine
//!
//! [`RuntimeSchema`] interprets the field table on every call: `write_to`
//! scans the records in declaration order, `merge_from` looks each incoming
//! field number up in the [`FieldMap`](super::FieldMap). Dispatch is a `match`
//! over the field type and the resolved storage.

use paste::paste;
use protoschema_sdk::{FieldType, Reader, WireError, Writer, READ_DONE};
use tracing::trace;

use super::descriptor::MessageDescriptor;
use super::storage::{with_field_types, Slot};
use super::table::{dispatch_fault, FieldRecord, FieldTable};
use super::{is_default, Schema};
use crate::access::{AccessPolicy, FieldAccessor};
use crate::error::SchemaResult;

/// Schema that interprets a field table per call
pub struct RuntimeSchema<M> {
    table: FieldTable<M>,
}

impl<M> RuntimeSchema<M> {
    /// Build the field table for a descriptor
    pub fn new(descriptor: MessageDescriptor<M>, policy: &AccessPolicy) -> SchemaResult<Self> {
        Ok(Self {
            table: FieldTable::build(descriptor, policy)?,
        })
    }

    /// The resolved field table
    pub fn table(&self) -> &FieldTable<M> {
        &self.table
    }
}

macro_rules! runtime_dispatch {
    (
        numeric: [$(($ft:ident, $slot:ident, $list:ident, $method:ident, $ty:ty)),* $(,)?],
        objects: [$(($oft:ident, $oslot:ident, $olist:ident, $omethod:ident, $oty:ty)),* $(,)?] $(,)?
    ) => {
        paste! {
            fn write_field<M>(
                message_name: &str,
                record: &FieldRecord<M>,
                message: &M,
                writer: &mut dyn Writer,
            ) -> Result<(), WireError> {
                let number = record.key.number;
                match (record.key.field_type, &record.slot) {
                    $(
                        (FieldType::$ft, Slot::$slot(access)) => {
                            let value = *access.get(message);
                            if !is_default(&value) {
                                writer.[<write_ $method>](number, value)?;
                            }
                        }
                        (FieldType::[<Repeated $ft>], Slot::$list(access)) => {
                            if let Some(values) = access.get(message) {
                                if !values.is_empty() {
                                    writer.[<write_ $method _list>](number, values, false)?;
                                }
                            }
                        }
                        (FieldType::[<Packed $ft>], Slot::$list(access)) => {
                            if let Some(values) = access.get(message) {
                                if !values.is_empty() {
                                    writer.[<write_ $method _list>](number, values, true)?;
                                }
                            }
                        }
                    )*
                    $(
                        (FieldType::$oft, Slot::$oslot(access)) => {
                            if let Some(value) = access.get(message) {
                                writer.[<write_ $omethod>](number, value)?;
                            }
                        }
                        (FieldType::[<Repeated $oft>], Slot::$olist(access)) => {
                            if let Some(values) = access.get(message) {
                                if !values.is_empty() {
                                    writer.[<write_ $omethod _list>](number, values)?;
                                }
                            }
                        }
                    )*
                    (FieldType::Message, Slot::Message(field))
                    | (FieldType::RepeatedMessage, Slot::MessageList(field)) => {
                        field.write(message, number, writer)?;
                    }
                    (field_type, _) => dispatch_fault(message_name, record.name, field_type),
                }
                Ok(())
            }

            fn merge_field<M>(
                message_name: &str,
                record: &FieldRecord<M>,
                message: &mut M,
                reader: &mut dyn Reader,
            ) -> Result<(), WireError> {
                match (record.key.field_type, &record.slot) {
                    $(
                        (FieldType::$ft, Slot::$slot(access)) => {
                            access.put(message, reader.[<read_ $method>]()?);
                        }
                        (FieldType::[<Repeated $ft>], Slot::$list(access)) => {
                            let target = access.get_mut(message).get_or_insert_with(Vec::new);
                            reader.[<read_ $method _list>](target, false)?;
                        }
                        (FieldType::[<Packed $ft>], Slot::$list(access)) => {
                            let target = access.get_mut(message).get_or_insert_with(Vec::new);
                            reader.[<read_ $method _list>](target, true)?;
                        }
                    )*
                    $(
                        (FieldType::$oft, Slot::$oslot(access)) => {
                            access.put(message, Some(reader.[<read_ $omethod>]()?));
                        }
                        (FieldType::[<Repeated $oft>], Slot::$olist(access)) => {
                            let target = access.get_mut(message).get_or_insert_with(Vec::new);
                            reader.[<read_ $omethod _list>](target)?;
                        }
                    )*
                    (FieldType::Message, Slot::Message(field))
                    | (FieldType::RepeatedMessage, Slot::MessageList(field)) => {
                        field.merge(message, reader)?;
                    }
                    (field_type, _) => dispatch_fault(message_name, record.name, field_type),
                }
                Ok(())
            }
        }
    };
}

with_field_types!(runtime_dispatch);

impl<M> Schema<M> for RuntimeSchema<M> {
    fn message_name(&self) -> &'static str {
        self.table.message()
    }

    fn write_to(&self, message: &M, writer: &mut dyn Writer) -> Result<(), WireError> {
        let name = self.table.message();
        for record in self.table.records() {
            write_field(name, record, message, writer)?;
        }
        Ok(())
    }

    fn merge_from(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError> {
        let name = self.table.message();
        loop {
            let number = reader.field_number()?;
            if number == READ_DONE {
                return Ok(());
            }

            match self.table.get(number) {
                Some(record) => merge_field(name, record, message, reader)?,
                None => {
                    trace!("{}: skipping unknown field {}", name, number);
                    if !reader.skip_field()? {
                        return Ok(());
                    }
                }
            }
        }
    }
}
