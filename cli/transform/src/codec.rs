//! NDJSON envelope codec.
//!
//! Each line is `{"message_key"?: str, "key"?: json, "value": json}`. JSON
//! objects decode to records whose schemas are inferred from the object's
//! shape and interned, so every object of the same shape shares one schema
//! instance. Scalars decode to primitives.

use ahash::RandomState;
use anyhow::{anyhow, bail, Context, Result};
use hashbrown::HashMap;
use kvx_types::{
    Body, Data, FieldType, GenericRecord, KeyValueEncoding, Message, PrimitiveType,
    PrimitiveValue, RecordSchema, SchemaRef, Value,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};
use std::fmt::Write as _;
use std::sync::Arc;

/// One input or output line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Json>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<KeyValueEncoding>,

    pub value: Json,
}

/// Record name plus `(field name, type signature)` pairs, in field order.
type Shape = (String, Vec<(String, String)>);

/// Interns record schemas by name and field shape.
#[derive(Debug, Default)]
pub struct SchemaInterner {
    schemas: HashMap<Shape, SchemaRef, RandomState>,
}

impl SchemaInterner {
    /// Returns the schema for `name` with `fields`, creating it on first use.
    pub fn intern(&mut self, name: &str, fields: &[(String, FieldType)]) -> Result<SchemaRef> {
        let shape: Shape = (
            name.to_string(),
            fields
                .iter()
                .map(|(field, ty)| {
                    let mut signature = String::new();
                    write_signature(&mut signature, ty);
                    (field.clone(), signature)
                })
                .collect(),
        );

        if let Some(schema) = self.schemas.get(&shape) {
            return Ok(Arc::clone(schema));
        }

        let schema = fields
            .iter()
            .fold(RecordSchema::builder(name), |b, (field, ty)| {
                b.simple_field(field.clone(), ty.clone())
            })
            .build()
            .with_context(|| format!("Cannot build schema for '{name}'"))?;
        self.schemas.insert(shape, Arc::clone(&schema));
        Ok(schema)
    }

    /// Number of distinct shapes seen so far.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn write_signature(out: &mut String, ty: &FieldType) {
    match ty {
        FieldType::Null => out.push_str("null"),
        FieldType::Primitive(p) => out.push_str(p.as_str()),
        // Nested schemas are interned first, so their identity captures their shape.
        FieldType::Record(schema) => {
            let _ = write!(out, "record{}", schema.id());
        }
        FieldType::Array(item) => {
            out.push('[');
            write_signature(out, item);
            out.push(']');
        }
        FieldType::Map(item) => {
            out.push('{');
            write_signature(out, item);
            out.push('}');
        }
        FieldType::Optional(inner) => {
            out.push('?');
            write_signature(out, inner);
        }
    }
}

/// Converts envelopes to messages and back.
#[derive(Debug, Default)]
pub struct Codec {
    interner: SchemaInterner,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interner(&self) -> &SchemaInterner {
        &self.interner
    }

    /// Parses one NDJSON line into a message.
    pub fn decode_line(&mut self, line: &str) -> Result<Message> {
        let envelope: Envelope = serde_json::from_str(line).context("Invalid envelope")?;
        self.decode(envelope)
    }

    pub fn decode(&mut self, envelope: Envelope) -> Result<Message> {
        let value = self.decode_side("value", &envelope.value)?;
        let mut message = match &envelope.key {
            Some(key) => Message::key_value(self.decode_side("key", key)?, value)
                .with_encoding(envelope.encoding.unwrap_or_default()),
            None => Message::new(value),
        };
        message.key = envelope.message_key;
        Ok(message)
    }

    fn decode_side(&mut self, name: &str, json: &Json) -> Result<Data> {
        Ok(match json {
            Json::Object(object) => Data::record(self.decode_record(name, object)?),
            Json::Bool(b) => Data::primitive(PrimitiveValue::Boolean(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Data::primitive(PrimitiveValue::Int64(i)),
                None => Data::primitive(PrimitiveValue::Double(number_to_f64(n)?)),
            },
            Json::String(s) => Data::string(s.clone()),
            Json::Null => bail!("{name} must not be null"),
            Json::Array(_) => bail!("{name} must be an object or a scalar, got an array"),
        })
    }

    fn decode_record(&mut self, name: &str, object: &Map<String, Json>) -> Result<GenericRecord> {
        let mut fields = Vec::with_capacity(object.len());
        let mut values = Vec::with_capacity(object.len());
        for (field, json) in object {
            let (ty, value) = self
                .decode_value(field, json)
                .with_context(|| format!("Field '{field}'"))?;
            fields.push((field.clone(), ty));
            values.push(value);
        }

        let schema = self.interner.intern(name, &fields)?;
        let mut builder = GenericRecord::builder(&schema);
        for ((field, _), value) in fields.iter().zip(values) {
            builder.put(field, value)?;
        }
        Ok(builder.build()?)
    }

    fn decode_value(&mut self, name: &str, json: &Json) -> Result<(FieldType, Value)> {
        Ok(match json {
            Json::Null => (FieldType::Null, Value::Null),
            Json::Bool(b) => (FieldType::Primitive(PrimitiveType::Boolean), Value::Boolean(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => (FieldType::Primitive(PrimitiveType::Int64), Value::Long(i)),
                None => (
                    FieldType::Primitive(PrimitiveType::Double),
                    Value::Double(number_to_f64(n)?),
                ),
            },
            Json::String(s) => (
                FieldType::Primitive(PrimitiveType::String),
                Value::from(s.as_str()),
            ),
            Json::Object(object) => {
                let record = self.decode_record(name, object)?;
                (FieldType::Record(Arc::clone(record.schema())), Value::from(record))
            }
            Json::Array(items) => {
                let mut item_type: Option<FieldType> = None;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let (ty, value) = self.decode_value(name, item)?;
                    item_type = Some(match item_type {
                        None => ty,
                        Some(prev) => unify(prev, ty)
                            .ok_or_else(|| anyhow!("mixed-type arrays are not supported"))?,
                    });
                    values.push(value);
                }
                (
                    FieldType::Array(Box::new(item_type.unwrap_or(FieldType::Null))),
                    Value::Array(values.into()),
                )
            }
        })
    }

    /// Renders a message as one envelope line.
    pub fn encode(&self, message: &Message, pretty: bool) -> Result<String> {
        let envelope = to_envelope(message);
        let json = if pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };
        Ok(json)
    }
}

/// Common type of two array items, if they have one.
fn unify(a: FieldType, b: FieldType) -> Option<FieldType> {
    match (a, b) {
        (a, b) if a == b => Some(a),
        (FieldType::Null, other) | (other, FieldType::Null) => Some(FieldType::optional(other)),
        (FieldType::Optional(inner), other) | (other, FieldType::Optional(inner))
            if *inner == other =>
        {
            Some(FieldType::Optional(inner))
        }
        _ => None,
    }
}

fn number_to_f64(n: &Number) -> Result<f64> {
    n.as_f64().ok_or_else(|| anyhow!("number {n} is out of range"))
}

pub fn to_envelope(message: &Message) -> Envelope {
    let (key, value, encoding) = match &message.body {
        Body::Single(value) => (None, value, None),
        Body::KeyValue {
            key,
            value,
            encoding,
        } => (
            Some(data_to_json(key)),
            value,
            (*encoding != KeyValueEncoding::default()).then_some(*encoding),
        ),
    };
    Envelope {
        message_key: message.key.clone(),
        key,
        encoding,
        value: data_to_json(value),
    }
}

pub fn data_to_json(data: &Data) -> Json {
    match data {
        Data::Record(record) => record_to_json(record),
        Data::Primitive(value) => match &**value {
            PrimitiveValue::Boolean(b) => Json::Bool(*b),
            PrimitiveValue::Int32(n) => Json::from(*n),
            PrimitiveValue::Int64(n) => Json::from(*n),
            PrimitiveValue::Float(n) => float_to_json(f64::from(*n)),
            PrimitiveValue::Double(n) => float_to_json(*n),
            PrimitiveValue::Bytes(bytes) => bytes_to_json(bytes),
            PrimitiveValue::String(s) => Json::String(s.clone()),
        },
        Data::Opaque(opaque) => {
            let mut object = Map::new();
            object.insert("format".to_string(), Json::String(opaque.format().to_string()));
            object.insert("bytes".to_string(), bytes_to_json(opaque.bytes()));
            Json::Object(object)
        }
    }
}

fn record_to_json(record: &GenericRecord) -> Json {
    Json::Object(
        record
            .iter()
            .map(|(name, value)| (name.to_string(), value_to_json(value)))
            .collect(),
    )
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::Long(n) => Json::from(*n),
        Value::Float(n) => float_to_json(f64::from(*n)),
        Value::Double(n) => float_to_json(*n),
        Value::Bytes(bytes) => bytes_to_json(bytes),
        Value::String(s) => Json::String(s.to_string()),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
        Value::Record(record) => record_to_json(record),
    }
}

fn float_to_json(n: f64) -> Json {
    Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
}

fn bytes_to_json(bytes: &[u8]) -> Json {
    Json::Array(bytes.iter().map(|b| Json::from(*b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_key_value_envelope() {
        let mut codec = Codec::new();
        let message = codec
            .decode_line(r#"{"message_key": "m1", "key": {"id": 7}, "value": {"name": "a", "score": 1.5}}"#)
            .unwrap();

        assert_eq!(message.key.as_deref(), Some("m1"));
        let Body::KeyValue { key, value, encoding } = &message.body else {
            panic!("expected key/value body");
        };
        assert_eq!(*encoding, KeyValueEncoding::Separated);

        let key = key.as_record().unwrap();
        assert_eq!(key.schema().name(), "key");
        assert_eq!(key.get("id"), Some(&Value::Long(7)));

        let value = value.as_record().unwrap();
        let names: Vec<_> = value.schema().field_names().collect();
        assert_eq!(names, vec!["name", "score"]);
        assert_eq!(value.get("score"), Some(&Value::Double(1.5)));
    }

    #[test]
    fn test_same_shape_shares_schema() {
        let mut codec = Codec::new();
        let a = codec.decode_line(r#"{"value": {"x": 1, "y": "a"}}"#).unwrap();
        let b = codec.decode_line(r#"{"value": {"x": 2, "y": "b"}}"#).unwrap();
        let c = codec.decode_line(r#"{"value": {"y": "c", "x": 3}}"#).unwrap();

        let schema = |m: &Message| match &m.body {
            Body::Single(Data::Record(r)) => Arc::clone(r.schema()),
            other => panic!("unexpected body {other:?}"),
        };
        assert!(Arc::ptr_eq(&schema(&a), &schema(&b)));
        assert!(!Arc::ptr_eq(&schema(&a), &schema(&c)));
        assert_eq!(codec.interner().len(), 2);
    }

    #[test]
    fn test_field_names_with_separators_do_not_share_schema() {
        let mut codec = Codec::new();
        codec.decode_line(r#"{"value": {"a:STRING|b": 1}}"#).unwrap();
        let message = codec.decode_line(r#"{"value": {"a": "x", "b": 2}}"#).unwrap();

        let Body::Single(value) = &message.body else {
            panic!("expected single body");
        };
        let names: Vec<_> = value.as_record().unwrap().schema().field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(codec.interner().len(), 2);
    }

    #[test]
    fn test_nested_records_and_arrays() {
        let mut codec = Codec::new();
        let message = codec
            .decode_line(r#"{"value": {"user": {"id": 1}, "tags": ["a", "b"], "maybe": [null, 2]}}"#)
            .unwrap();

        let Body::Single(value) = &message.body else {
            panic!("expected single body");
        };
        let record = value.as_record().unwrap();
        let user = record.get("user").and_then(Value::as_record).unwrap();
        assert_eq!(user.schema().name(), "user");
        assert_eq!(
            record.schema().field("maybe").unwrap().field_type(),
            &FieldType::Array(Box::new(FieldType::optional(FieldType::Primitive(
                PrimitiveType::Int64
            ))))
        );
    }

    #[test]
    fn test_decode_scalars() {
        let mut codec = Codec::new();
        let message = codec.decode_line(r#"{"key": "k", "value": 42}"#).unwrap();
        assert_eq!(
            message,
            Message::key_value(Data::string("k"), Data::primitive(PrimitiveValue::Int64(42)))
        );
        assert!(codec.interner().is_empty());
    }

    #[test]
    fn test_decode_errors() {
        let mut codec = Codec::new();
        assert!(codec.decode_line("not json").is_err());
        assert!(codec.decode_line(r#"{"key": "k"}"#).is_err());
        assert!(codec.decode_line(r#"{"value": null}"#).is_err());
        assert!(codec.decode_line(r#"{"value": [1, 2]}"#).is_err());
        assert!(codec.decode_line(r#"{"value": {"mixed": [1, "a"]}}"#).is_err());
    }

    #[test]
    fn test_encode_round_trip() {
        let mut codec = Codec::new();
        let line = r#"{"message_key":"m","key":{"b":1,"a":"x"},"encoding":"inline","value":{"z":[true,null],"y":{"n":2.5}}}"#;
        let message = codec.decode_line(line).unwrap();
        assert_eq!(codec.encode(&message, false).unwrap(), line);
    }

    #[test]
    fn test_encode_primitives_and_opaque() {
        let codec = Codec::new();

        let bytes = Message::new(Data::primitive(PrimitiveValue::Bytes(vec![1, 2])));
        assert_eq!(codec.encode(&bytes, false).unwrap(), r#"{"value":[1,2]}"#);

        let opaque = Message::new(Data::opaque("protobuf", vec![8]));
        assert_eq!(
            codec.encode(&opaque, false).unwrap(),
            r#"{"value":{"format":"protobuf","bytes":[8]}}"#
        );

        let pretty = codec.encode(&Message::new(Data::string("s")), true).unwrap();
        assert!(pretty.contains('\n'));
    }
}
