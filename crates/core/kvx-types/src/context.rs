//! Per-message working unit passed through a step chain.

use crate::data::Data;
use crate::message::{Body, KeyValueEncoding, Message};
use crate::schema::Schema;

/// Key side, value side, and modification flags for one message.
///
/// A context is owned by exactly one call at a time; steps receive it by
/// mutable reference and never share it across threads.
///
/// Replacing a side with a different object marks it modified. Replacing it
/// with the object already there is not a modification.
#[derive(Debug, Clone)]
pub struct TransformContext {
    message_key: Option<String>,
    key: Option<Data>,
    value: Data,
    encoding: KeyValueEncoding,
    key_modified: bool,
    value_modified: bool,
}

impl TransformContext {
    /// Creates a keyless context.
    pub fn new(value: Data) -> Self {
        Self {
            message_key: None,
            key: None,
            value,
            encoding: KeyValueEncoding::default(),
            key_modified: false,
            value_modified: false,
        }
    }

    /// Creates a context for a paired key/value.
    pub fn with_key(key: Data, value: Data) -> Self {
        Self {
            key: Some(key),
            ..Self::new(value)
        }
    }

    /// Splits a message into its key and value sides.
    pub fn from_message(message: Message) -> Self {
        let mut context = match message.body {
            Body::Single(value) => Self::new(value),
            Body::KeyValue {
                key,
                value,
                encoding,
            } => {
                let mut context = Self::with_key(key, value);
                context.encoding = encoding;
                context
            }
        };
        context.message_key = message.key;
        context
    }

    /// Reassembles a message from the final state of the context.
    ///
    /// A context that still has a key side yields a key/value body.
    pub fn into_message(self) -> Message {
        let body = match self.key {
            Some(key) => Body::KeyValue {
                key,
                value: self.value,
                encoding: self.encoding,
            },
            None => Body::Single(self.value),
        };
        Message {
            key: self.message_key,
            body,
        }
    }

    pub fn message_key(&self) -> Option<&str> {
        self.message_key.as_deref()
    }

    pub fn key(&self) -> Option<&Data> {
        self.key.as_ref()
    }

    pub fn value(&self) -> &Data {
        &self.value
    }

    pub fn key_schema(&self) -> Option<Schema> {
        self.key.as_ref().map(Data::schema)
    }

    pub fn value_schema(&self) -> Schema {
        self.value.schema()
    }

    pub fn encoding(&self) -> KeyValueEncoding {
        self.encoding
    }

    /// Returns true if the context carries a paired key/value.
    pub fn is_key_value(&self) -> bool {
        self.key.is_some()
    }

    pub fn key_modified(&self) -> bool {
        self.key_modified
    }

    pub fn value_modified(&self) -> bool {
        self.value_modified
    }

    /// Replaces the key side.
    pub fn replace_key(&mut self, key: Data) {
        let changed = match &self.key {
            Some(current) => !Data::ptr_eq(current, &key),
            None => true,
        };
        self.key = Some(key);
        self.key_modified |= changed;
    }

    /// Replaces the value side.
    pub fn replace_value(&mut self, value: Data) {
        if !Data::ptr_eq(&self.value, &value) {
            self.value = value;
            self.value_modified = true;
        }
    }

    /// Removes and returns the key side, leaving a keyless context.
    pub fn take_key(&mut self) -> Option<Data> {
        self.key.take()
    }

    /// Flags the value as modified without replacing it.
    pub fn mark_value_modified(&mut self) {
        self.value_modified = true;
    }
}
