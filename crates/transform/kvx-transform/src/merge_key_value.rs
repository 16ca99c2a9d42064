//! Folds the key record's fields into the value record.

use crate::cache::MergeSchemaCache;
use kvx_error::Result;
use kvx_traits::TransformStep;
use kvx_types::{derive, Data, GenericRecord, TransformContext};
use tracing::{debug, trace};

/// Replaces the value record with one carrying the key's fields as well.
///
/// The merged schema comes from [`derive::merge_fields`] and is cached per
/// (key schema, value schema) pair. Where both sides declare a field, the
/// value's definition and value are kept. The key side is left as it was.
pub struct MergeKeyValueStep {
    cache: MergeSchemaCache,
}

impl std::fmt::Debug for MergeKeyValueStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeKeyValueStep")
            .field("cache", &self.cache)
            .finish()
    }
}

impl MergeKeyValueStep {
    pub fn new() -> Self {
        debug!("Created MergeKeyValueStep");
        Self {
            cache: MergeSchemaCache::new(),
        }
    }

    /// Merged schemas keyed by (key schema, value schema).
    pub fn cache(&self) -> &MergeSchemaCache {
        &self.cache
    }

    fn merge(&self, key: &GenericRecord, value: &GenericRecord) -> Result<GenericRecord> {
        let key_schema = key.schema();
        let value_schema = value.schema();
        let merged = self
            .cache
            .get_or_insert_with((key_schema.id(), value_schema.id()), || {
                derive::merge_fields(key_schema, value_schema)
            });

        // Value fields shadow colliding key fields.
        Ok(GenericRecord::project_from(&merged, &[value, key])?)
    }
}

impl Default for MergeKeyValueStep {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStep for MergeKeyValueStep {
    fn process(&self, context: &mut TransformContext) -> Result<()> {
        let (Some(Data::Record(key)), Data::Record(value)) = (context.key(), context.value()) else {
            trace!("Key or value is not a record, skipping merge");
            return Ok(());
        };

        let merged = self.merge(key, value)?;
        context.replace_value(Data::record(merged));
        Ok(())
    }

    fn name(&self) -> &str {
        "merge-key-value"
    }
}
