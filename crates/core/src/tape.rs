//! In-memory reader/writer pair
//!
//! [`TapeWriter`] records every call a schema makes as a [`WireEvent`];
//! [`TapeReader`] replays a recording as a [`Reader`]. Together they give a
//! round trip without a byte format, and make writer-call sequences directly
//! comparable between schemas.
//!
//! ```text
//! write_int32(1, 5)                 Field    { 1, Int32(5) }
//! write_sint32_list(2, [1, 2], no)  Field    { 2, SInt32(1) }
//!                                   Field    { 2, SInt32(2) }
//! write_double_list(3, [..], yes)   Packed   { 3, [Double(..), ..] }
//! write_message(4, body)            MessageStart { 4 }
//!                                     ...events from body...
//!                                   MessageEnd
//! ```

use paste::paste;
use protoschema_sdk::{MergeBody, Reader, WireError, WriteBody, Writer, READ_DONE};

/// One recorded value
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Double(f64),
    Float(f32),
    Int32(i32),
    UInt32(u32),
    SInt32(i32),
    Fixed32(u32),
    SFixed32(i32),
    Int64(i64),
    UInt64(u64),
    SInt64(i64),
    Fixed64(u64),
    SFixed64(i64),
    Bool(bool),
    Enum(i32),
    String(String),
    Bytes(Vec<u8>),
}

/// One recorded writer call (or element of a non-packed list)
#[derive(Debug, Clone, PartialEq)]
pub enum WireEvent {
    /// A single field entry
    Field { number: u32, value: WireValue },
    /// A packed list, recorded as one entry
    Packed { number: u32, values: Vec<WireValue> },
    /// Start of a nested message
    MessageStart { number: u32 },
    /// End of the innermost nested message
    MessageEnd,
}

impl WireEvent {
    /// Field number of the entry, `None` for [`WireEvent::MessageEnd`]
    pub fn number(&self) -> Option<u32> {
        match self {
            WireEvent::Field { number, .. }
            | WireEvent::Packed { number, .. }
            | WireEvent::MessageStart { number } => Some(*number),
            WireEvent::MessageEnd => None,
        }
    }
}

/// Writer that records events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TapeWriter {
    events: Vec<WireEvent>,
}

impl TapeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events
    pub fn events(&self) -> &[WireEvent] {
        &self.events
    }

    /// Append a raw event
    pub fn push(&mut self, event: WireEvent) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<WireEvent> {
        self.events
    }

    /// Replay the recording
    pub fn into_reader(self) -> TapeReader {
        TapeReader::new(self.events)
    }
}

/// Reader that replays recorded events
#[derive(Debug, Clone)]
pub struct TapeReader {
    events: Vec<WireEvent>,
    pos: usize,
}

impl TapeReader {
    pub fn new(events: Vec<WireEvent>) -> Self {
        Self { events, pos: 0 }
    }

    /// Events not yet consumed
    pub fn remaining(&self) -> &[WireEvent] {
        &self.events[self.pos..]
    }

    fn peek(&self) -> Option<&WireEvent> {
        self.events.get(self.pos)
    }

    fn current_number(&self) -> u32 {
        self.peek().and_then(WireEvent::number).unwrap_or(READ_DONE)
    }

    fn has_field(&self) -> bool {
        self.current_number() != READ_DONE
    }

    /// Take the next single-value entry
    fn take_value(&mut self) -> Result<(u32, WireValue), WireError> {
        match self.events.get(self.pos) {
            Some(WireEvent::Field { number, value }) => {
                let entry = (*number, value.clone());
                self.pos += 1;
                Ok(entry)
            }
            Some(WireEvent::Packed { number, .. }) => Err(WireError::TypeMismatch {
                field_number: *number,
                expected: "single value",
                found: "packed list",
            }),
            Some(WireEvent::MessageStart { number }) => Err(WireError::TypeMismatch {
                field_number: *number,
                expected: "single value",
                found: "message",
            }),
            Some(WireEvent::MessageEnd) | None => Err(WireError::UnexpectedEof),
        }
    }

    /// Take the next entry as list elements, packed or not
    fn take_values(&mut self) -> Result<(u32, Vec<WireValue>), WireError> {
        if let Some(WireEvent::Packed { number, values }) = self.events.get(self.pos) {
            let entry = (*number, values.clone());
            self.pos += 1;
            return Ok(entry);
        }
        let (number, value) = self.take_value()?;
        Ok((number, vec![value]))
    }
}

impl WireValue {
    /// Kind name of the value, as used in type mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Double(_) => "double",
            WireValue::Float(_) => "float",
            WireValue::Int32(_) => "int32",
            WireValue::UInt32(_) => "uint32",
            WireValue::SInt32(_) => "sint32",
            WireValue::Fixed32(_) => "fixed32",
            WireValue::SFixed32(_) => "sfixed32",
            WireValue::Int64(_) => "int64",
            WireValue::UInt64(_) => "uint64",
            WireValue::SInt64(_) => "sint64",
            WireValue::Fixed64(_) => "fixed64",
            WireValue::SFixed64(_) => "sfixed64",
            WireValue::Bool(_) => "bool",
            WireValue::Enum(_) => "enum",
            WireValue::String(_) => "string",
            WireValue::Bytes(_) => "bytes",
        }
    }
}

macro_rules! tape_methods {
    ($(($variant:ident, $method:ident, $ty:ty)),* $(,)?) => {
        paste! {
            fn write_values<T: Clone>(
                tape: &mut TapeWriter,
                number: u32,
                values: &[T],
                packed: bool,
                wrap: fn(T) -> WireValue,
            ) {
                if packed {
                    tape.push(WireEvent::Packed {
                        number,
                        values: values.iter().cloned().map(wrap).collect(),
                    });
                } else {
                    for value in values {
                        tape.push(WireEvent::Field {
                            number,
                            value: wrap(value.clone()),
                        });
                    }
                }
            }

            impl Writer for TapeWriter {
                $(
                    fn [<write_ $method>](&mut self, number: u32, value: $ty) -> Result<(), WireError> {
                        self.push(WireEvent::Field {
                            number,
                            value: WireValue::$variant(value),
                        });
                        Ok(())
                    }

                    fn [<write_ $method _list>](
                        &mut self,
                        number: u32,
                        values: &[$ty],
                        packed: bool,
                    ) -> Result<(), WireError> {
                        write_values(self, number, values, packed, WireValue::$variant);
                        Ok(())
                    }
                )*

                fn write_string(&mut self, number: u32, value: &str) -> Result<(), WireError> {
                    self.push(WireEvent::Field {
                        number,
                        value: WireValue::String(value.to_string()),
                    });
                    Ok(())
                }

                fn write_bytes(&mut self, number: u32, value: &[u8]) -> Result<(), WireError> {
                    self.push(WireEvent::Field {
                        number,
                        value: WireValue::Bytes(value.to_vec()),
                    });
                    Ok(())
                }

                fn write_string_list(&mut self, number: u32, values: &[String]) -> Result<(), WireError> {
                    write_values(self, number, values, false, WireValue::String);
                    Ok(())
                }

                fn write_bytes_list(&mut self, number: u32, values: &[Vec<u8>]) -> Result<(), WireError> {
                    write_values(self, number, values, false, WireValue::Bytes);
                    Ok(())
                }

                fn write_message(
                    &mut self,
                    number: u32,
                    body: &mut WriteBody<'_>,
                ) -> Result<(), WireError> {
                    self.push(WireEvent::MessageStart { number });
                    body(self)?;
                    self.push(WireEvent::MessageEnd);
                    Ok(())
                }
            }

            impl Reader for TapeReader {
                fn field_number(&mut self) -> Result<u32, WireError> {
                    Ok(self.current_number())
                }

                fn skip_field(&mut self) -> Result<bool, WireError> {
                    match self.peek() {
                        Some(WireEvent::Field { .. }) | Some(WireEvent::Packed { .. }) => {
                            self.pos += 1;
                        }
                        Some(WireEvent::MessageStart { number }) => {
                            let number = *number;
                            let mut depth = 0usize;
                            loop {
                                match self.events.get(self.pos) {
                                    Some(WireEvent::MessageStart { .. }) => depth += 1,
                                    Some(WireEvent::MessageEnd) => depth -= 1,
                                    Some(_) => {}
                                    None => return Err(WireError::UnbalancedMessage(number)),
                                }
                                self.pos += 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                        }
                        Some(WireEvent::MessageEnd) | None => return Err(WireError::UnexpectedEof),
                    }
                    Ok(self.has_field())
                }

                $(
                    fn [<read_ $method>](&mut self) -> Result<$ty, WireError> {
                        match self.take_value()? {
                            (_, WireValue::$variant(value)) => Ok(value),
                            (field_number, other) => Err(WireError::TypeMismatch {
                                field_number,
                                expected: stringify!($method),
                                found: other.kind_name(),
                            }),
                        }
                    }

                    fn [<read_ $method _list>](
                        &mut self,
                        target: &mut Vec<$ty>,
                        _packed: bool,
                    ) -> Result<(), WireError> {
                        let (field_number, values) = self.take_values()?;
                        for value in values {
                            match value {
                                WireValue::$variant(value) => target.push(value),
                                other => {
                                    return Err(WireError::TypeMismatch {
                                        field_number,
                                        expected: stringify!($method),
                                        found: other.kind_name(),
                                    })
                                }
                            }
                        }
                        Ok(())
                    }
                )*

                fn read_string(&mut self) -> Result<String, WireError> {
                    match self.take_value()? {
                        (_, WireValue::String(value)) => Ok(value),
                        (field_number, other) => Err(WireError::TypeMismatch {
                            field_number,
                            expected: "string",
                            found: other.kind_name(),
                        }),
                    }
                }

                fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
                    match self.take_value()? {
                        (_, WireValue::Bytes(value)) => Ok(value),
                        (field_number, other) => Err(WireError::TypeMismatch {
                            field_number,
                            expected: "bytes",
                            found: other.kind_name(),
                        }),
                    }
                }

                fn read_string_list(&mut self, target: &mut Vec<String>) -> Result<(), WireError> {
                    target.push(self.read_string()?);
                    Ok(())
                }

                fn read_bytes_list(&mut self, target: &mut Vec<Vec<u8>>) -> Result<(), WireError> {
                    target.push(self.read_bytes()?);
                    Ok(())
                }

                fn read_message(&mut self, merge: &mut MergeBody<'_>) -> Result<(), WireError> {
                    let number = match self.peek() {
                        Some(WireEvent::MessageStart { number }) => *number,
                        Some(WireEvent::Field { number, value }) => {
                            return Err(WireError::TypeMismatch {
                                field_number: *number,
                                expected: "message",
                                found: value.kind_name(),
                            })
                        }
                        Some(WireEvent::Packed { number, .. }) => {
                            return Err(WireError::TypeMismatch {
                                field_number: *number,
                                expected: "message",
                                found: "packed list",
                            })
                        }
                        Some(WireEvent::MessageEnd) | None => return Err(WireError::UnexpectedEof),
                    };
                    self.pos += 1;

                    merge(self)?;

                    match self.peek() {
                        Some(WireEvent::MessageEnd) => {
                            self.pos += 1;
                            Ok(())
                        }
                        _ => Err(WireError::UnbalancedMessage(number)),
                    }
                }
            }
        }
    };
}

tape_methods! {
    (Double, double, f64),
    (Float, float, f32),
    (Int32, int32, i32),
    (UInt32, uint32, u32),
    (SInt32, sint32, i32),
    (Fixed32, fixed32, u32),
    (SFixed32, sfixed32, i32),
    (Int64, int64, i64),
    (UInt64, uint64, u64),
    (SInt64, sint64, i64),
    (Fixed64, fixed64, u64),
    (SFixed64, sfixed64, i64),
    (Bool, bool, bool),
    (Enum, enum, i32),
}
