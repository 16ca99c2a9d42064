//! Removes named fields from the key and/or value records.

use crate::cache::DropSchemaCache;
use kvx_error::Result;
use kvx_traits::TransformStep;
use kvx_types::{derive, Data, TransformContext};
use tracing::{debug, trace};

/// Projects record sides onto a schema without the configured fields.
///
/// Each side has its own schema cache, so a source schema is reduced at most
/// once per step instance no matter how many messages carry it. Sides that are
/// absent, not records, or declare none of the configured fields are left
/// untouched.
pub struct DropFieldStep {
    key_fields: Vec<String>,
    value_fields: Vec<String>,
    key_cache: DropSchemaCache,
    value_cache: DropSchemaCache,
}

impl std::fmt::Debug for DropFieldStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropFieldStep")
            .field("key_fields", &self.key_fields)
            .field("value_fields", &self.value_fields)
            .finish_non_exhaustive()
    }
}

impl DropFieldStep {
    /// Creates a step dropping `key_fields` from the key record and
    /// `value_fields` from the value record.
    pub fn new<K, V>(key_fields: K, value_fields: V) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let key_fields: Vec<String> = key_fields.into_iter().map(Into::into).collect();
        let value_fields: Vec<String> = value_fields.into_iter().map(Into::into).collect();
        debug!(?key_fields, ?value_fields, "Created DropFieldStep");

        Self {
            key_fields,
            value_fields,
            key_cache: DropSchemaCache::new(),
            value_cache: DropSchemaCache::new(),
        }
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn value_fields(&self) -> &[String] {
        &self.value_fields
    }

    /// Derived schemas for key records, keyed by source schema.
    pub fn key_cache(&self) -> &DropSchemaCache {
        &self.key_cache
    }

    /// Derived schemas for value records, keyed by source schema.
    pub fn value_cache(&self) -> &DropSchemaCache {
        &self.value_cache
    }

    /// Computes the reduced form of one side, or `None` if it stays as is.
    fn reduce(fields: &[String], cache: &DropSchemaCache, data: &Data) -> Result<Option<Data>> {
        let Some(record) = data.as_record() else {
            return Ok(None);
        };
        let schema = record.schema();

        if !cache.contains(&schema.id()) && !fields.iter().any(|f| schema.has_field(f)) {
            trace!(schema = %schema.full_name(), "No fields to drop");
            return Ok(None);
        }

        let derived = cache.get_or_insert_with(schema.id(), || derive::drop_fields(schema, fields));
        let projected = record.project(&derived)?;
        Ok(Some(Data::record(projected)))
    }
}

impl TransformStep for DropFieldStep {
    fn process(&self, context: &mut TransformContext) -> Result<()> {
        let key = match context.key() {
            Some(key) => Self::reduce(&self.key_fields, &self.key_cache, key)?,
            None => None,
        };
        let value = Self::reduce(&self.value_fields, &self.value_cache, context.value())?;

        if let Some(key) = key {
            context.replace_key(key);
        }
        if let Some(value) = value {
            context.replace_value(value);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "drop-fields"
    }
}
