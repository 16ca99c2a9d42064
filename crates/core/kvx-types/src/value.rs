//! Dynamically typed field values and generic records.

use crate::schema::{PrimitiveType, SchemaRef};
use kvx_error::SchemaError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A dynamically typed field value.
///
/// Strings, byte buffers, arrays, and maps are reference counted so that
/// copying a field from one record into another does not reallocate its
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Arc<[u8]>),
    String(Arc<str>),
    Array(Arc<[Value]>),
    Map(Arc<BTreeMap<String, Value>>),
    Record(Arc<GenericRecord>),
}

impl Value {
    /// Returns the scalar type of this value, if it is a scalar.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Boolean(_) => Some(PrimitiveType::Boolean),
            Value::Int(_) => Some(PrimitiveType::Int32),
            Value::Long(_) => Some(PrimitiveType::Int64),
            Value::Float(_) => Some(PrimitiveType::Float),
            Value::Double(_) => Some(PrimitiveType::Double),
            Value::Bytes(_) => Some(PrimitiveType::Bytes),
            Value::String(_) => Some(PrimitiveType::String),
            Value::Null | Value::Array(_) | Value::Map(_) | Value::Record(_) => None,
        }
    }

    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Map(_) => "MAP",
            Value::Record(_) => "RECORD",
            other => other.primitive_type().map(|t| t.as_str()).unwrap_or("UNKNOWN"),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<GenericRecord>> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Arc::from(v))
    }
}

impl From<GenericRecord> for Value {
    fn from(v: GenericRecord) -> Self {
        Value::Record(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A record: a schema reference plus one value per schema field.
///
/// Values are stored positionally in schema field order. Records are never
/// modified after construction; steps build new records instead.
#[derive(Debug, Clone)]
pub struct GenericRecord {
    schema: SchemaRef,
    values: Vec<Value>,
}

impl GenericRecord {
    /// Starts building a record under `schema`.
    pub fn builder(schema: &SchemaRef) -> GenericRecordBuilder {
        GenericRecordBuilder::new(schema)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Returns the value of the named field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).map(|idx| &self.values[idx])
    }

    /// Returns values in schema field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterates `(field name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema.field_names().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a record under `target` by copying each of its fields, by name,
    /// from this record.
    ///
    /// `target` is expected to be derived from this record's schema, so no
    /// type checks are performed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingValue`] if `target` names a field this
    /// record does not have.
    pub fn project(&self, target: &SchemaRef) -> Result<GenericRecord, SchemaError> {
        Self::project_from(target, &[self])
    }

    /// Builds a record under `target`, taking each field from the first of
    /// `sources` that declares it.
    ///
    /// Like [`project`](Self::project), `target` is expected to be derived
    /// from the sources' schemas and no type checks are performed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingValue`] if no source has a field that
    /// `target` names.
    pub fn project_from(
        target: &SchemaRef,
        sources: &[&GenericRecord],
    ) -> Result<GenericRecord, SchemaError> {
        let values = target
            .field_names()
            .map(|name| {
                sources
                    .iter()
                    .find_map(|&source| source.get(name))
                    .cloned()
                    .ok_or_else(|| SchemaError::MissingValue {
                        schema: target.full_name(),
                        field: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GenericRecord {
            schema: Arc::clone(target),
            values,
        })
    }
}

impl PartialEq for GenericRecord {
    fn eq(&self, other: &Self) -> bool {
        self.schema.id() == other.schema.id() && self.values == other.values
    }
}

/// Builder for [`GenericRecord`].
#[derive(Debug, Clone)]
pub struct GenericRecordBuilder {
    schema: SchemaRef,
    values: Vec<Option<Value>>,
}

impl GenericRecordBuilder {
    pub fn new(schema: &SchemaRef) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: vec![None; schema.len()],
        }
    }

    /// Sets a field value, consuming and returning the builder.
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self, SchemaError> {
        self.put(name, value)?;
        Ok(self)
    }

    /// Sets a field value.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema has no such field or the value does not
    /// match the field type.
    pub fn put(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        let value = value.into();
        let idx = self
            .schema
            .position(name)
            .ok_or_else(|| SchemaError::UnknownField {
                schema: self.schema.full_name(),
                field: name.to_string(),
            })?;

        let field_type = self.schema.fields()[idx].field_type();
        if !field_type.accepts(&value) {
            return Err(SchemaError::TypeMismatch {
                field: name.to_string(),
                expected: field_type.to_string(),
                actual: value.type_name().to_string(),
            });
        }

        self.values[idx] = Some(value);
        Ok(())
    }

    /// Builds the record, filling unset fields from their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingValue`] if an unset field has no default
    /// and is not nullable.
    pub fn build(self) -> Result<GenericRecord, SchemaError> {
        let schema = self.schema;
        let values = self
            .values
            .into_iter()
            .zip(schema.fields())
            .map(|(value, field)| match value {
                Some(v) => Ok(v),
                None => match field.default_value() {
                    Some(default) => Ok(default.clone()),
                    None if field.field_type().is_nullable() => Ok(Value::Null),
                    None => Err(SchemaError::MissingValue {
                        schema: schema.full_name(),
                        field: field.name().to_string(),
                    }),
                },
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GenericRecord { schema, values })
    }
}
