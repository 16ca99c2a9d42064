//! Canonical text rendering of values and records.
//!
//! Records render as `{"name": value, ...}` in schema field order, with
//! `", "` between entries. This is the text form produced when a record is
//! cast to a string.

use crate::value::{GenericRecord, Value};
use std::fmt::{self, Write};

fn write_quoted(f: &mut impl Write, s: &str) -> fmt::Result {
    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

fn write_entries<'a, W, I>(f: &mut W, entries: I) -> fmt::Result
where
    W: Write,
    I: Iterator<Item = (&'a str, &'a Value)>,
{
    f.write_char('{')?;
    for (i, (name, value)) in entries.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_quoted(f, name)?;
        f.write_str(": ")?;
        write_value(f, value)?;
    }
    f.write_char('}')
}

fn write_value(f: &mut impl Write, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Boolean(b) => write!(f, "{b}"),
        Value::Int(n) => write!(f, "{n}"),
        Value::Long(n) => write!(f, "{n}"),
        Value::Float(n) => write!(f, "{n:?}"),
        Value::Double(n) => write!(f, "{n:?}"),
        Value::String(s) => write_quoted(f, s),
        Value::Bytes(bytes) => {
            // Each byte rendered as the code point of the same value.
            let chars: String = bytes.iter().map(|b| char::from(*b)).collect();
            f.write_str("{\"bytes\": ")?;
            write_quoted(f, &chars)?;
            f.write_char('}')
        }
        Value::Array(items) => {
            f.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, item)?;
            }
            f.write_char(']')
        }
        Value::Map(entries) => write_entries(f, entries.iter().map(|(k, v)| (k.as_str(), v))),
        Value::Record(record) => write_entries(f, record.iter()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self)
    }
}

impl fmt::Display for GenericRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, self.iter())
    }
}
