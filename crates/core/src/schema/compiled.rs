//! Compiled schema plan
//!
//! [`CompiledSchema`] turns the field table into a plan of boxed per-field
//! closures once, when the schema is built. `write_to` runs the write steps in
//! declaration order; `merge_from` finds the merge step for each incoming field
//! number through a dense step table or a sorted step array, whichever
//! [`DispatchShape::select`] favours for the message's field numbers.
//!
//! ```text
//! writes:  [ step(1) | step(2) | step(3) | ... ]      declaration order
//! merges:  Dense  { low, [Some(step) | None | ...] }   number - low
//!          Sparse { [(1, step), (2, step), (100, step)] }
//! ```
//!
//! In the compact shape each step calls a shared routine from
//! [`emit`](super::specialized::emit); in the inline shape the default check
//! and the reader/writer call live in the step itself.

use std::sync::Arc;

use paste::paste;
use protoschema_sdk::{DispatchShape, FieldType, Reader, WireError, Writer, READ_DONE};
use tracing::{debug, trace};

use super::descriptor::MessageDescriptor;
use super::nested::MessageField;
use super::specialized::emit;
use super::storage::{with_field_types, Slot};
use super::table::{dispatch_fault, FieldRecord, FieldTable};
use super::{is_default, Schema};
use crate::access::{AccessPolicy, FieldAccessor};
use crate::config::CodeShape;
use crate::error::SchemaResult;

type WriteStep<M> = Box<dyn Fn(&M, &mut dyn Writer) -> Result<(), WireError> + Send + Sync>;
type MergeStep<M> = Box<dyn Fn(&mut M, &mut dyn Reader) -> Result<(), WireError> + Send + Sync>;

fn write_step<M, F>(step: F) -> WriteStep<M>
where
    F: Fn(&M, &mut dyn Writer) -> Result<(), WireError> + Send + Sync + 'static,
{
    Box::new(step)
}

fn merge_step<M, F>(step: F) -> MergeStep<M>
where
    F: Fn(&mut M, &mut dyn Reader) -> Result<(), WireError> + Send + Sync + 'static,
{
    Box::new(step)
}

/// Merge steps laid out for field-number dispatch
enum MergeDispatch<M> {
    Dense {
        low: u32,
        steps: Box<[Option<MergeStep<M>>]>,
    },
    Sparse {
        steps: Box<[(u32, MergeStep<M>)]>,
    },
}

impl<M> MergeDispatch<M> {
    fn new(steps: Vec<(u32, MergeStep<M>)>) -> Self {
        let (low, high) = match (steps.first(), steps.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => {
                return MergeDispatch::Sparse {
                    steps: Box::new([]),
                }
            }
        };

        match DispatchShape::select(low, high, steps.len()) {
            DispatchShape::Table => {
                let mut dense: Vec<Option<MergeStep<M>>> =
                    (low..=high).map(|_| None).collect();
                for (number, step) in steps {
                    dense[(number - low) as usize] = Some(step);
                }
                MergeDispatch::Dense {
                    low,
                    steps: dense.into_boxed_slice(),
                }
            }
            DispatchShape::Lookup => MergeDispatch::Sparse {
                steps: steps.into_boxed_slice(),
            },
        }
    }

    #[inline]
    fn find(&self, number: u32) -> Option<&MergeStep<M>> {
        match self {
            MergeDispatch::Dense { low, steps } => {
                let index = number.checked_sub(*low)? as usize;
                steps.get(index)?.as_ref()
            }
            MergeDispatch::Sparse { steps } => steps
                .binary_search_by_key(&number, |(n, _)| *n)
                .ok()
                .map(|index| &steps[index].1),
        }
    }

    fn shape(&self) -> DispatchShape {
        match self {
            MergeDispatch::Dense { .. } => DispatchShape::Table,
            MergeDispatch::Sparse { .. } => DispatchShape::Lookup,
        }
    }
}

/// Schema running a plan of per-field closures built once per type
pub struct CompiledSchema<M> {
    message: &'static str,
    shape: CodeShape,
    writes: Box<[WriteStep<M>]>,
    merges: MergeDispatch<M>,
}

impl<M: 'static> CompiledSchema<M> {
    /// Compile the plan for a descriptor
    ///
    /// # Arguments
    /// * `descriptor` - Validated message descriptor
    /// * `policy` - Access selection rules
    /// * `shape` - Code shape of the generated steps
    pub fn new(
        descriptor: MessageDescriptor<M>,
        policy: &AccessPolicy,
        shape: CodeShape,
    ) -> SchemaResult<Self> {
        let table = FieldTable::build(descriptor, policy)?;
        let message = table.message();

        let mut writes = Vec::with_capacity(table.records().len());
        let mut merges = Vec::with_capacity(table.records().len());
        for record in table.into_records() {
            let number = record.key.number;
            let (write, merge) = match shape {
                CodeShape::Compact => compile_compact(message, record),
                CodeShape::Inline => compile_inline(message, record),
            };
            writes.push(write);
            merges.push((number, merge));
        }

        let merges = MergeDispatch::new(merges);
        debug!(
            "Compiled {}: {} steps, {} shape, {} dispatch",
            message,
            writes.len(),
            shape.name(),
            merges.shape().name()
        );

        Ok(Self {
            message,
            shape,
            writes: writes.into_boxed_slice(),
            merges,
        })
    }
}

impl<M> CompiledSchema<M> {
    /// Code shape of the plan
    pub fn shape(&self) -> CodeShape {
        self.shape
    }

    /// Layout of the merge dispatch
    pub fn dispatch(&self) -> DispatchShape {
        self.merges.shape()
    }
}

fn message_steps<M: 'static>(
    field: Box<dyn MessageField<M>>,
    number: u32,
) -> (WriteStep<M>, MergeStep<M>) {
    let field: Arc<dyn MessageField<M>> = Arc::from(field);
    let merge_field = Arc::clone(&field);
    (
        write_step(move |m, w| field.write(m, number, w)),
        merge_step(move |m, r| merge_field.merge(m, r)),
    )
}

macro_rules! compile_plans {
    (
        numeric: [$(($ft:ident, $slot:ident, $list:ident, $method:ident, $ty:ty)),* $(,)?],
        objects: [$(($oft:ident, $oslot:ident, $olist:ident, $omethod:ident, $oty:ty)),* $(,)?] $(,)?
    ) => {
        paste! {
            fn compile_compact<M: 'static>(
                message_name: &'static str,
                record: FieldRecord<M>,
            ) -> (WriteStep<M>, MergeStep<M>) {
                let FieldRecord { key, name, slot } = record;
                let number = key.number;
                let packed = key.field_type.is_packed();

                match (key.field_type, slot) {
                    $(
                        (FieldType::$ft, Slot::$slot(access)) => (
                            write_step(move |m, w| emit::[<write_ $method>](w, number, *access.get(m))),
                            merge_step(move |m, r| emit::[<merge_ $method>](r, access.get_mut(m))),
                        ),
                        (FieldType::[<Repeated $ft>] | FieldType::[<Packed $ft>], Slot::$list(access)) => (
                            write_step(move |m, w| {
                                emit::[<write_ $method _list>](w, number, access.get(m), packed)
                            }),
                            merge_step(move |m, r| {
                                emit::[<merge_ $method _list>](r, access.get_mut(m), packed)
                            }),
                        ),
                    )*
                    $(
                        (FieldType::$oft, Slot::$oslot(access)) => (
                            write_step(move |m, w| emit::[<write_ $omethod>](w, number, access.get(m))),
                            merge_step(move |m, r| emit::[<merge_ $omethod>](r, access.get_mut(m))),
                        ),
                        (FieldType::[<Repeated $oft>], Slot::$olist(access)) => (
                            write_step(move |m, w| emit::[<write_ $omethod _list>](w, number, access.get(m))),
                            merge_step(move |m, r| emit::[<merge_ $omethod _list>](r, access.get_mut(m))),
                        ),
                    )*
                    (FieldType::Message, Slot::Message(field))
                    | (FieldType::RepeatedMessage, Slot::MessageList(field)) => {
                        message_steps(field, number)
                    }
                    (field_type, _) => dispatch_fault(message_name, name, field_type),
                }
            }

            fn compile_inline<M: 'static>(
                message_name: &'static str,
                record: FieldRecord<M>,
            ) -> (WriteStep<M>, MergeStep<M>) {
                let FieldRecord { key, name, slot } = record;
                let number = key.number;
                let packed = key.field_type.is_packed();

                match (key.field_type, slot) {
                    $(
                        (FieldType::$ft, Slot::$slot(access)) => (
                            write_step(move |m, w| {
                                let value = *access.get(m);
                                if is_default(&value) {
                                    return Ok(());
                                }
                                w.[<write_ $method>](number, value)
                            }),
                            merge_step(move |m, r| {
                                let value = r.[<read_ $method>]()?;
                                access.put(m, value);
                                Ok(())
                            }),
                        ),
                        (FieldType::[<Repeated $ft>] | FieldType::[<Packed $ft>], Slot::$list(access)) => (
                            write_step(move |m, w| match access.get(m) {
                                Some(values) if !values.is_empty() => {
                                    w.[<write_ $method _list>](number, values, packed)
                                }
                                _ => Ok(()),
                            }),
                            merge_step(move |m, r| {
                                let target = access.get_mut(m).get_or_insert_with(Vec::new);
                                r.[<read_ $method _list>](target, packed)
                            }),
                        ),
                    )*
                    $(
                        (FieldType::$oft, Slot::$oslot(access)) => (
                            write_step(move |m, w| match access.get(m) {
                                Some(value) => w.[<write_ $omethod>](number, value),
                                None => Ok(()),
                            }),
                            merge_step(move |m, r| {
                                let value = r.[<read_ $omethod>]()?;
                                access.put(m, Some(value));
                                Ok(())
                            }),
                        ),
                        (FieldType::[<Repeated $oft>], Slot::$olist(access)) => (
                            write_step(move |m, w| match access.get(m) {
                                Some(values) if !values.is_empty() => {
                                    w.[<write_ $omethod _list>](number, values)
                                }
                                _ => Ok(()),
                            }),
                            merge_step(move |m, r| {
                                let target = access.get_mut(m).get_or_insert_with(Vec::new);
                                r.[<read_ $omethod _list>](target)
                            }),
                        ),
                    )*
                    (FieldType::Message, Slot::Message(field))
                    | (FieldType::RepeatedMessage, Slot::MessageList(field)) => {
                        message_steps(field, number)
                    }
                    (field_type, _) => dispatch_fault(message_name, name, field_type),
                }
            }
        }
    };
}

with_field_types!(compile_plans);

impl<M> Schema<M> for CompiledSchema<M> {
    fn message_name(&self) -> &'static str {
        self.message
    }

    fn write_to(&self, message: &M, writer: &mut dyn Writer) -> Result<(), WireError> {
        for step in self.writes.iter() {
            step(message, &mut *writer)?;
        }
        Ok(())
    }

    fn merge_from(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError> {
        loop {
            let number = reader.field_number()?;
            if number == READ_DONE {
                return Ok(());
            }

            match self.merges.find(number) {
                Some(step) => step(&mut *message, &mut *reader)?,
                None => {
                    trace!("{}: skipping unknown field {}", self.message, number);
                    if !reader.skip_field()? {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuntimeSchema;
    use crate::tape::{TapeWriter, WireEvent, WireValue};
    use crate::testing::{full_sample, Empty, Sample, Sparse};
    use crate::Message;

    fn compiled<M: Message>(shape: CodeShape) -> CompiledSchema<M> {
        CompiledSchema::new(M::descriptor().unwrap(), &AccessPolicy::default(), shape).unwrap()
    }

    #[test]
    fn test_dispatch_shape_follows_numbers() {
        assert_eq!(compiled::<Sample>(CodeShape::Compact).dispatch(), DispatchShape::Table);
        assert_eq!(compiled::<Sparse>(CodeShape::Inline).dispatch(), DispatchShape::Lookup);
        assert_eq!(compiled::<Empty>(CodeShape::Compact).dispatch(), DispatchShape::Lookup);
    }

    #[test]
    fn test_round_trip_both_shapes() {
        let original = full_sample();
        for shape in [CodeShape::Compact, CodeShape::Inline] {
            let schema = compiled::<Sample>(shape);
            assert_eq!(schema.shape(), shape);

            let mut tape = TapeWriter::new();
            schema.write_to(&original, &mut tape).unwrap();

            let mut decoded = Sample::default();
            schema.merge_from(&mut decoded, &mut tape.into_reader()).unwrap();
            assert_eq!(decoded, original, "{shape:?}");
        }
    }

    #[test]
    fn test_parity_with_runtime() {
        let runtime =
            RuntimeSchema::new(Sample::descriptor().unwrap(), &AccessPolicy::default()).unwrap();
        let original = full_sample();

        let mut expected = TapeWriter::new();
        runtime.write_to(&original, &mut expected).unwrap();

        let mut runtime_state = Sample::default();
        runtime
            .merge_from(&mut runtime_state, &mut expected.clone().into_reader())
            .unwrap();

        for shape in [CodeShape::Compact, CodeShape::Inline] {
            let schema = compiled::<Sample>(shape);
            let mut tape = TapeWriter::new();
            schema.write_to(&original, &mut tape).unwrap();
            assert_eq!(tape.events(), expected.events(), "{shape:?}");

            let mut state = Sample::default();
            schema
                .merge_from(&mut state, &mut expected.clone().into_reader())
                .unwrap();
            assert_eq!(state, runtime_state, "{shape:?}");
        }
    }

    #[test]
    fn test_sparse_skip_and_continue() {
        let mut tape = TapeWriter::new();
        tape.push(WireEvent::Field {
            number: 50,
            value: WireValue::UInt64(1),
        });
        tape.push(WireEvent::Field {
            number: 100,
            value: WireValue::String("tail".to_string()),
        });
        tape.push(WireEvent::Field {
            number: 1,
            value: WireValue::Int32(-3),
        });

        for shape in [CodeShape::Compact, CodeShape::Inline] {
            let mut decoded = Sparse::default();
            compiled::<Sparse>(shape)
                .merge_from(&mut decoded, &mut tape.clone().into_reader())
                .unwrap();
            assert_eq!(decoded.first, -3);
            assert_eq!(decoded.last.as_deref(), Some("tail"));
        }
    }

    #[test]
    fn test_empty_message() {
        let schema = compiled::<Empty>(CodeShape::Inline);
        let mut tape = TapeWriter::new();
        schema.write_to(&Empty::default(), &mut tape).unwrap();
        assert!(tape.events().is_empty());

        tape.push(WireEvent::Field {
            number: 1,
            value: WireValue::Bool(true),
        });
        schema
            .merge_from(&mut Empty::default(), &mut tape.into_reader())
            .unwrap();
    }
}
