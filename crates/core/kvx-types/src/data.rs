//! Representation of one side (key or value) of a message.

use crate::schema::{PrimitiveType, Schema};
use crate::value::GenericRecord;
use std::sync::Arc;

/// A single scalar carried as a whole key or value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
}

impl PrimitiveValue {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Boolean(_) => PrimitiveType::Boolean,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Int64(_) => PrimitiveType::Int64,
            Self::Float(_) => PrimitiveType::Float,
            Self::Double(_) => PrimitiveType::Double,
            Self::Bytes(_) => PrimitiveType::Bytes,
            Self::String(_) => PrimitiveType::String,
        }
    }
}

/// Payload in an encoding the steps do not interpret.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueData {
    format: Arc<str>,
    bytes: Vec<u8>,
}

impl OpaqueData {
    pub fn new(format: impl Into<Arc<str>>, bytes: Vec<u8>) -> Self {
        Self {
            format: format.into(),
            bytes,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The closed set of representations a key or value can take.
///
/// Schema and payload travel together, so replacing one always replaces the
/// other. Identity of a side is the identity of the shared allocation; see
/// [`Data::ptr_eq`].
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Record(Arc<GenericRecord>),
    Primitive(Arc<PrimitiveValue>),
    Opaque(Arc<OpaqueData>),
}

impl Data {
    pub fn record(record: GenericRecord) -> Self {
        Data::Record(Arc::new(record))
    }

    pub fn primitive(value: PrimitiveValue) -> Self {
        Data::Primitive(Arc::new(value))
    }

    /// Shorthand for a string primitive.
    pub fn string(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveValue::String(value.into()))
    }

    pub fn opaque(format: impl Into<Arc<str>>, bytes: Vec<u8>) -> Self {
        Data::Opaque(Arc::new(OpaqueData::new(format, bytes)))
    }

    /// Returns the schema describing this representation.
    pub fn schema(&self) -> Schema {
        match self {
            Data::Record(record) => Schema::Record(Arc::clone(record.schema())),
            Data::Primitive(value) => Schema::Primitive(value.primitive_type()),
            Data::Opaque(opaque) => Schema::Opaque(Arc::clone(&opaque.format)),
        }
    }

    pub fn as_record(&self) -> Option<&Arc<GenericRecord>> {
        match self {
            Data::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Data::Primitive(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if both refer to the same allocation.
    pub fn ptr_eq(a: &Data, b: &Data) -> bool {
        match (a, b) {
            (Data::Record(a), Data::Record(b)) => Arc::ptr_eq(a, b),
            (Data::Primitive(a), Data::Primitive(b)) => Arc::ptr_eq(a, b),
            (Data::Opaque(a), Data::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<GenericRecord> for Data {
    fn from(record: GenericRecord) -> Self {
        Data::record(record)
    }
}

impl From<PrimitiveValue> for Data {
    fn from(value: PrimitiveValue) -> Self {
        Data::primitive(value)
    }
}
