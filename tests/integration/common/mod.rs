//! Common fixtures for integration tests.

use kvx_types::{Data, FieldType, GenericRecord, Message, PrimitiveType, RecordSchema, SchemaRef};

/// A schema of string fields.
pub fn string_schema(name: &str, fields: &[&str]) -> SchemaRef {
    fields
        .iter()
        .fold(RecordSchema::builder(name).namespace("kvx.test"), |b, f| {
            b.simple_field(*f, FieldType::Primitive(PrimitiveType::String))
        })
        .build()
        .expect("valid schema")
}

/// A record of string values under `schema`, in field order.
pub fn string_record(schema: &SchemaRef, values: &[&str]) -> Data {
    let mut builder = GenericRecord::builder(schema);
    for (name, value) in schema.field_names().zip(values) {
        builder.put(name, *value).expect("field accepts string");
    }
    Data::record(builder.build().expect("complete record"))
}

/// Key schema with `keyField1..3`.
pub fn key_schema() -> SchemaRef {
    string_schema("key", &["keyField1", "keyField2", "keyField3"])
}

/// Value schema with `valueField1..3`.
pub fn value_schema() -> SchemaRef {
    string_schema("value", &["valueField1", "valueField2", "valueField3"])
}

/// A key/value message with the given field values.
pub fn key_value_message(
    key_schema: &SchemaRef,
    key: &[&str],
    value_schema: &SchemaRef,
    value: &[&str],
) -> Message {
    Message::key_value(
        string_record(key_schema, key),
        string_record(value_schema, value),
    )
}

/// Field names of a record side.
pub fn field_names(data: &Data) -> Vec<String> {
    data.as_record()
        .expect("record side")
        .schema()
        .field_names()
        .map(str::to_string)
        .collect()
}
