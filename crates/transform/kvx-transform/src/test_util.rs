//! Shared fixtures for step tests.

use kvx_types::{Data, FieldType, GenericRecord, PrimitiveType, RecordSchema, SchemaRef};

pub fn string_schema(name: &str, fields: &[&str]) -> SchemaRef {
    fields
        .iter()
        .fold(RecordSchema::builder(name), |b, f| {
            b.simple_field(*f, FieldType::Primitive(PrimitiveType::String))
        })
        .build()
        .unwrap()
}

pub fn string_record(schema: &SchemaRef, values: &[&str]) -> Data {
    let mut builder = GenericRecord::builder(schema);
    for (name, value) in schema.field_names().zip(values) {
        builder.put(name, *value).unwrap();
    }
    Data::record(builder.build().unwrap())
}

pub fn key_schema() -> SchemaRef {
    string_schema("key", &["keyField1", "keyField2", "keyField3"])
}

pub fn value_schema() -> SchemaRef {
    string_schema("value", &["valueField1", "valueField2", "valueField3"])
}

pub fn key_record(schema: &SchemaRef) -> Data {
    string_record(schema, &["key1", "key2", "key3"])
}

pub fn value_record(schema: &SchemaRef) -> Data {
    string_record(schema, &["value1", "value2", "value3"])
}

/// Field names of a record side.
pub fn field_names(data: &Data) -> Vec<String> {
    data.as_record()
        .unwrap()
        .schema()
        .field_names()
        .map(str::to_string)
        .collect()
}
