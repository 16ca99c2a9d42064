//! Record schema model.
//!
//! A [`RecordSchema`] is immutable once built and carries a [`SchemaId`]
//! handle. Caches throughout the workspace key on that handle, never on
//! structural equality.

use crate::value::Value;
use ahash::RandomState;
use hashbrown::HashMap;
use kvx_error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Shared reference to a record schema.
pub type SchemaRef = Arc<RecordSchema>;

/// Process-unique handle of a [`RecordSchema`].
///
/// Handles are assigned at construction and never reused, so two schemas
/// built separately never share one, even when structurally identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl SchemaId {
    fn next() -> Self {
        Self(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw handle value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scalar types usable both as record field types and as whole-message
/// representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveType {
    /// Upper-case name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Bytes => "BYTES",
            Self::String => "STRING",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort hint carried on each field. Never interpreted by the steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
    Ignore,
}

/// Type of a single record field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Null,
    Primitive(PrimitiveType),
    Record(SchemaRef),
    Array(Box<FieldType>),
    Map(Box<FieldType>),
    /// Union of `null` and the inner type.
    Optional(Box<FieldType>),
}

impl FieldType {
    /// Wraps a type so that `null` is also accepted.
    pub fn optional(inner: FieldType) -> Self {
        match inner {
            FieldType::Null | FieldType::Optional(_) => inner,
            other => FieldType::Optional(Box::new(other)),
        }
    }

    /// Returns true if `null` is a valid value for this type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Null | FieldType::Optional(_))
    }

    /// Checks whether `value` conforms to this type.
    ///
    /// Nested records must be built under the very schema instance the field
    /// refers to.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Null, Value::Null) => true,
            (FieldType::Optional(_), Value::Null) => true,
            (FieldType::Optional(inner), v) => inner.accepts(v),
            (FieldType::Primitive(ty), v) => v.primitive_type() == Some(*ty),
            (FieldType::Record(schema), Value::Record(record)) => {
                record.schema().id() == schema.id()
            }
            (FieldType::Array(item), Value::Array(items)) => items.iter().all(|v| item.accepts(v)),
            (FieldType::Map(item), Value::Map(entries)) => {
                entries.values().all(|v| item.accepts(v))
            }
            _ => false,
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Null, FieldType::Null) => true,
            (FieldType::Primitive(a), FieldType::Primitive(b)) => a == b,
            (FieldType::Record(a), FieldType::Record(b)) => a.id() == b.id(),
            (FieldType::Array(a), FieldType::Array(b)) => a == b,
            (FieldType::Map(a), FieldType::Map(b)) => a == b,
            (FieldType::Optional(a), FieldType::Optional(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Null => f.write_str("NULL"),
            FieldType::Primitive(ty) => write!(f, "{ty}"),
            FieldType::Record(schema) => write!(f, "RECORD({})", schema.full_name()),
            FieldType::Array(item) => write!(f, "ARRAY<{item}>"),
            FieldType::Map(item) => write!(f, "MAP<{item}>"),
            FieldType::Optional(inner) => write!(f, "OPTIONAL<{inner}>"),
        }
    }
}

/// A named field within a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    name: String,
    field_type: FieldType,
    doc: Option<String>,
    default: Option<Value>,
    order: SortOrder,
}

impl FieldSchema {
    /// Creates a field with no doc, no default, and ascending order.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            doc: None,
            default: None,
            order: SortOrder::default(),
        }
    }

    /// Sets the field documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Sets the default value used when a record leaves the field unset.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the sort hint.
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

/// Structural description of a record: ordered, uniquely named fields.
pub struct RecordSchema {
    id: SchemaId,
    name: String,
    namespace: Option<String>,
    doc: Option<String>,
    is_error: bool,
    fields: Vec<FieldSchema>,
    positions: HashMap<String, usize, RandomState>,
}

impl RecordSchema {
    /// Starts building a record schema with the given name.
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder::new(name)
    }

    /// Assembles a schema from fields already known to have unique names.
    pub(crate) fn assemble(
        name: String,
        namespace: Option<String>,
        doc: Option<String>,
        is_error: bool,
        fields: Vec<FieldSchema>,
    ) -> SchemaRef {
        let mut positions = HashMap::with_capacity_and_hasher(fields.len(), RandomState::new());
        for (idx, field) in fields.iter().enumerate() {
            positions.insert(field.name.clone(), idx);
        }

        Arc::new(Self {
            id: SchemaId::next(),
            name,
            namespace,
            doc,
            is_error,
            fields,
            positions,
        })
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns `namespace.name`, or just the name when there is no namespace.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Iterates field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.position(name).map(|idx| &self.fields[idx])
    }

    /// Returns the position of a field within [`fields`](Self::fields).
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("id", &self.id)
            .field("name", &self.full_name())
            .field("is_error", &self.is_error)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    name: String,
    namespace: Option<String>,
    doc: Option<String>,
    is_error: bool,
    fields: Vec<FieldSchema>,
}

impl RecordSchemaBuilder {
    /// Creates a builder for a record with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            is_error: false,
            fields: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Marks the record as an error record.
    pub fn error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    /// Appends a field.
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a field with only a name and type.
    pub fn simple_field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(FieldSchema::new(name, field_type))
    }

    /// Validates field names and defaults and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if two fields share a name or a default does not
    /// match its field type.
    pub fn build(self) -> Result<SchemaRef, SchemaError> {
        let display_name = match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        };

        {
            let mut seen = hashbrown::HashSet::with_capacity(self.fields.len());
            for field in &self.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        schema: display_name,
                        field: field.name.clone(),
                    });
                }
                if let Some(default) = &field.default {
                    if !field.field_type.accepts(default) {
                        return Err(SchemaError::InvalidDefault {
                            field: field.name.clone(),
                            expected: field.field_type.to_string(),
                        });
                    }
                }
            }
        }

        Ok(RecordSchema::assemble(
            self.name,
            self.namespace,
            self.doc,
            self.is_error,
            self.fields,
        ))
    }
}

/// Representation of one side (key or value) of a message.
#[derive(Debug, Clone)]
pub enum Schema {
    /// Structured record
    Record(SchemaRef),
    /// Single scalar
    Primitive(PrimitiveType),
    /// Any encoding the steps do not understand, named by its format
    Opaque(Arc<str>),
}

impl Schema {
    /// Returns the record schema for the record representation.
    pub fn as_record(&self) -> Option<&SchemaRef> {
        match self {
            Schema::Record(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Schema::Record(_))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Schema::Record(a), Schema::Record(b)) => a.id() == b.id(),
            (Schema::Primitive(a), Schema::Primitive(b)) => a == b,
            (Schema::Opaque(a), Schema::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Record(schema) => write!(f, "RECORD({})", schema.full_name()),
            Schema::Primitive(ty) => write!(f, "{ty}"),
            Schema::Opaque(format) => write!(f, "OPAQUE({format})"),
        }
    }
}
