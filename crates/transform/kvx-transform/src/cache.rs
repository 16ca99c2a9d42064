//! Memoized schema derivations.
//!
//! Each step instance owns its caches. Entries are keyed by [`SchemaId`]
//! handles (or pairs of them), created lazily and never evicted.

use ahash::RandomState;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use kvx_types::{SchemaId, SchemaRef};
use parking_lot::RwLock;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// Thread-safe map from source schema handle(s) to a derived schema.
///
/// Lookups take a shared lock. On a miss the derived schema is computed
/// outside the lock and inserted under the exclusive lock; if another thread
/// inserted first, its schema is returned and the local candidate discarded,
/// so every caller observes the same derived identity.
pub struct SchemaCache<K> {
    entries: RwLock<HashMap<K, SchemaRef, RandomState>>,
}

/// Cache keyed by a single source schema.
pub type DropSchemaCache = SchemaCache<SchemaId>;

/// Cache keyed by a (key schema, value schema) pair.
pub type MergeSchemaCache = SchemaCache<(SchemaId, SchemaId)>;

impl<K> SchemaCache<K>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Returns the cached derivation for `key`, if any.
    pub fn get(&self, key: &K) -> Option<SchemaRef> {
        self.entries.read().get(key).cloned()
    }

    /// Returns true if a derivation is cached for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the cached derivation for `key`, computing and inserting it
    /// with `derive` on a miss. The first inserted value wins.
    pub fn get_or_insert_with<F>(&self, key: K, derive: F) -> SchemaRef
    where
        F: FnOnce() -> SchemaRef,
    {
        if let Some(schema) = self.get(&key) {
            trace!(?key, "Schema cache hit");
            return schema;
        }

        let candidate = derive();
        let (schema, inserted, cache_size) = {
            let mut entries = self.entries.write();
            let (schema, inserted) = match entries.entry(key) {
                Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
                Entry::Vacant(entry) => (Arc::clone(entry.insert(candidate)), true),
            };
            (schema, inserted, entries.len())
        };

        if inserted {
            debug!(?key, derived = %schema.id(), cache_size, "Cached derived schema");
        } else {
            trace!(?key, "Schema cached by another caller, discarding candidate");
        }
        schema
    }

    /// Returns the number of cached derivations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for SchemaCache<K>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for SchemaCache<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}
