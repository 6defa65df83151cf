//! protoschema SDK - Field Types and Reader/Writer Contracts
//!
//! This crate holds the definitions every other crate in the workspace agrees
//! on. It carries no schema logic, so codecs and the derive macro can depend on
//! it without pulling in the engine.
//!
//! # Modules
//!
//! - [`field_type`] - The 48-variant field type taxonomy
//! - [`io`] - [`Reader`] / [`Writer`] contracts consumed by schemas
//! - [`dispatch`] - Table-vs-lookup cost model for field-number dispatch
//! - [`error`] - Reader/writer error type

pub mod dispatch;
pub mod error;
pub mod field_type;
pub mod io;

pub use dispatch::DispatchShape;
pub use error::WireError;
pub use field_type::{FieldType, ScalarKind, UnknownFieldType, WireCategory};
pub use io::{MergeBody, Reader, WriteBody, Writer, MAX_FIELD_NUMBER, READ_DONE};
