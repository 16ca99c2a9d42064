//! Messages exchanged with the hosting runtime.

use crate::data::Data;
use serde::{Deserialize, Serialize};

/// How a paired key/value is laid out on the wire. Carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyValueEncoding {
    /// Key and value encoded separately (key travels as the message key)
    #[default]
    Separated,
    /// Key and value encoded together in the message payload
    Inline,
}

/// Message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// A single value
    Single(Data),
    /// A key/value pair under one paired schema
    KeyValue {
        key: Data,
        value: Data,
        encoding: KeyValueEncoding,
    },
}

/// A message as decoded by the codec layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Routing key, independent of any key schema
    pub key: Option<String>,

    /// Decoded payload
    pub body: Body,
}

impl Message {
    /// Creates a keyless single-value message.
    pub fn new(value: Data) -> Self {
        Self {
            key: None,
            body: Body::Single(value),
        }
    }

    /// Creates a paired key/value message with separated encoding.
    pub fn key_value(key: Data, value: Data) -> Self {
        Self {
            key: None,
            body: Body::KeyValue {
                key,
                value,
                encoding: KeyValueEncoding::default(),
            },
        }
    }

    /// Sets the routing key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the key/value encoding. No effect on single-value messages.
    pub fn with_encoding(mut self, new_encoding: KeyValueEncoding) -> Self {
        if let Body::KeyValue { encoding, .. } = &mut self.body {
            *encoding = new_encoding;
        }
        self
    }

    pub fn is_key_value(&self) -> bool {
        matches!(self.body, Body::KeyValue { .. })
    }
}
