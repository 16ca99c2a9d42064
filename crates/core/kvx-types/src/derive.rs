//! Schema derivation shared by the steps.
//!
//! Every function here returns a schema with a fresh [`SchemaId`], even for
//! the same inputs. Callers memoize the result per source schema.
//!
//! [`SchemaId`]: crate::schema::SchemaId

use crate::schema::{RecordSchema, SchemaRef};

/// Derives a schema equal to `source` without the fields named in `names`.
///
/// Name, namespace, doc, and error flag are kept. Surviving fields keep their
/// relative order and their type, doc, default, and sort order.
pub fn drop_fields<S: AsRef<str>>(source: &RecordSchema, names: &[S]) -> SchemaRef {
    let fields = source
        .fields()
        .iter()
        .filter(|f| !names.iter().any(|n| n.as_ref() == f.name()))
        .cloned()
        .collect();

    RecordSchema::assemble(
        source.name().to_string(),
        source.namespace().map(str::to_string),
        source.doc().map(str::to_string),
        source.is_error(),
        fields,
    )
}

/// Derives the schema of a key record merged into a value record.
///
/// Fields are the key fields whose names the value schema does not declare,
/// in key order, followed by every value field in value order. A colliding
/// key field is dropped, not merged. The result is named after the value
/// schema, carries no doc, and is never an error record.
pub fn merge_fields(key: &RecordSchema, value: &RecordSchema) -> SchemaRef {
    let fields = key
        .fields()
        .iter()
        .filter(|f| !value.has_field(f.name()))
        .chain(value.fields().iter())
        .cloned()
        .collect();

    RecordSchema::assemble(
        value.name().to_string(),
        value.namespace().map(str::to_string),
        None,
        false,
        fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType, PrimitiveType, SortOrder};

    fn string_schema(name: &str, fields: &[&str]) -> SchemaRef {
        fields
            .iter()
            .fold(RecordSchema::builder(name).namespace("ns").doc("docs"), |b, f| {
                b.simple_field(*f, FieldType::Primitive(PrimitiveType::String))
            })
            .error(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_drop_fields_keeps_order_and_metadata() {
        let source = RecordSchema::builder("record")
            .namespace("ns")
            .simple_field("a", FieldType::Primitive(PrimitiveType::String))
            .field(
                FieldSchema::new("b", FieldType::Primitive(PrimitiveType::Int32))
                    .with_doc("bee")
                    .with_default(5)
                    .with_order(SortOrder::Ignore),
            )
            .simple_field("c", FieldType::Primitive(PrimitiveType::String))
            .build()
            .unwrap();

        let derived = drop_fields(&source, &["a", "missing"]);
        let names: Vec<_> = derived.field_names().collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(derived.field("b"), source.field("b"));
        assert_eq!(derived.full_name(), "ns.record");
        assert_ne!(derived.id(), source.id());
    }

    #[test]
    fn test_each_derivation_is_a_new_identity() {
        let source = string_schema("record", &["a", "b"]);
        let first = drop_fields(&source, &["a"]);
        let second = drop_fields(&source, &["a"]);
        assert_eq!(first.fields(), second.fields());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_merge_value_definition_wins() {
        let key = string_schema("key", &["a", "b", "c"]);
        let value = string_schema("value", &["b", "d"]);

        let merged = merge_fields(&key, &value);
        let names: Vec<_> = merged.field_names().collect();
        assert_eq!(names, vec!["a", "c", "b", "d"]);
        assert_eq!(merged.name(), "value");
        assert_eq!(merged.namespace(), Some("ns"));
        assert_eq!(merged.doc(), None);
        assert!(!merged.is_error());
    }
}
