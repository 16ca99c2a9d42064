//! Core data model for kvx.
//!
//! - [`RecordSchema`] / [`FieldSchema`] - immutable record schemas with a
//!   process-unique [`SchemaId`]
//! - [`Value`] / [`GenericRecord`] - dynamically typed records
//! - [`Data`] - the closed set of key/value representations
//! - [`Message`] / [`TransformContext`] - what flows into and through a step chain
//! - [`derive`] - schema derivation used by the steps

mod context;
mod data;
pub mod derive;
mod message;
mod render;
mod schema;
mod value;

pub use context::TransformContext;
pub use data::{Data, OpaqueData, PrimitiveValue};
pub use message::{Body, KeyValueEncoding, Message};
pub use schema::{
    FieldSchema, FieldType, PrimitiveType, RecordSchema, RecordSchemaBuilder, Schema, SchemaId,
    SchemaRef, SortOrder,
};
pub use value::{GenericRecord, GenericRecordBuilder, Value};
