//! Resolved field table shared by the runtime and compiled schemas

use std::fmt;

use protoschema_sdk::{DispatchShape, FieldType};
use tracing::debug;

use super::descriptor::MessageDescriptor;
use super::field_map::FieldMap;
use super::storage::Slot;
use crate::access::AccessPolicy;
use crate::error::SchemaResult;

/// Field type and number of a table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub field_type: FieldType,
    pub number: u32,
}

/// One field with its resolved accessor
pub struct FieldRecord<M> {
    pub key: FieldKey,
    pub name: &'static str,
    pub slot: Slot<M>,
}

impl<M> fmt::Debug for FieldRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRecord")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("storage", &self.slot.kind())
            .field("access", &self.slot.strategy())
            .finish()
    }
}

/// Fields in declaration order plus the number index
pub struct FieldTable<M> {
    message: &'static str,
    records: Vec<FieldRecord<M>>,
    map: FieldMap,
}

impl<M> FieldTable<M> {
    /// Resolve every field's accessor and index the table
    ///
    /// # Errors
    /// [`SchemaError::AccessDenied`](crate::SchemaError::AccessDenied) when a
    /// field cannot be reached under `policy`.
    pub fn build(descriptor: MessageDescriptor<M>, policy: &AccessPolicy) -> SchemaResult<Self> {
        let (message, fields) = descriptor.into_parts();

        let records = fields
            .into_iter()
            .map(|field| {
                Ok(FieldRecord {
                    key: FieldKey {
                        field_type: field.field_type,
                        number: field.number,
                    },
                    name: field.name,
                    slot: field.storage.resolve(policy, message, field.name)?,
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        let numbers: Vec<u32> = records.iter().map(|r| r.key.number).collect();
        let map = FieldMap::new(&numbers);

        debug!(
            "Built field table for {}: {} fields, {} dispatch",
            message,
            records.len(),
            map.shape().name()
        );

        Ok(Self {
            message,
            records,
            map,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_records(message: &'static str, records: Vec<FieldRecord<M>>) -> Self {
        let numbers: Vec<u32> = records.iter().map(|r| r.key.number).collect();
        Self {
            message,
            map: FieldMap::new(&numbers),
            records,
        }
    }

    /// Message name
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Records in declaration order
    pub fn records(&self) -> &[FieldRecord<M>] {
        &self.records
    }

    /// Take the records out of the table
    pub fn into_records(self) -> Vec<FieldRecord<M>> {
        self.records
    }

    /// Record for a field number
    #[inline]
    pub fn get(&self, number: u32) -> Option<&FieldRecord<M>> {
        self.map.position_of(number).map(|i| &self.records[i])
    }

    /// Dispatch shape of the number index
    pub fn shape(&self) -> DispatchShape {
        self.map.shape()
    }
}

/// Report a field type paired with the wrong storage
///
/// Descriptor validation rules this out, so reaching it means the table is
/// corrupt.
#[cold]
#[inline(never)]
pub(crate) fn dispatch_fault(message: &str, field: &str, field_type: FieldType) -> ! {
    panic!("{message}.{field}: no dispatch for {field_type} with the resolved storage")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessStrategy;
    use crate::{access, direct};

    #[derive(Default)]
    struct Pair {
        left: i32,
        right: Option<String>,
    }

    #[test]
    fn test_build_table() {
        let descriptor = MessageDescriptor::<Pair>::builder("Pair")
            .field(2, "left", FieldType::SInt32, direct!(Pair, left))
            .field(7, "right", FieldType::String, access!(Pair, right: Option<String>))
            .build()
            .unwrap();

        let policy = AccessPolicy {
            prefer_offset: true,
            offset_supported: true,
        };
        let table = FieldTable::build(descriptor, &policy).unwrap();

        assert_eq!(table.message(), "Pair");
        assert_eq!(table.records().len(), 2);
        assert_eq!(table.shape(), DispatchShape::Lookup);

        let left = table.get(2).unwrap();
        assert_eq!(left.name, "left");
        assert_eq!(left.slot.strategy(), AccessStrategy::Direct);

        let right = table.get(7).unwrap();
        assert_eq!(right.key.field_type, FieldType::String);
        assert_eq!(right.slot.strategy(), AccessStrategy::Offset);

        assert!(table.get(3).is_none());
    }

    #[test]
    #[should_panic(expected = "Pair.left")]
    fn test_dispatch_fault_names_field() {
        dispatch_fault("Pair", "left", FieldType::Bool);
    }
}
