//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use sqadapter_core::{FieldValue, IndexDefinition, Lookup, Segment};

use crate::error::{Result, StoreError};
use crate::traits::{Database, KeyIter, SegmentIndex, SegmentIter};
use crate::validate::{key_string, key_value, resolve_lookup, resolve_segment, to_segment};

/// Rows keyed by rendered primary key, values in definition order.
type Rows = BTreeMap<String, Vec<FieldValue>>;

/// In-memory database.
///
/// All data is lost when the database is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryDatabase {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryDatabase {
    /// Create a new empty database.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Handle to an in-memory index. Clones share the same rows.
#[derive(Clone)]
pub struct MemoryIndex {
    definition: Arc<IndexDefinition>,
    rows: Arc<RwLock<Rows>>,
}

impl MemoryIndex {
    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>> {
        self.rows
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>> {
        self.rows
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Index = MemoryIndex;

    async fn index_by_name(&self, name: &str) -> Result<Option<MemoryIndex>> {
        let indexes = self
            .indexes
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(indexes.get(name).cloned())
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<MemoryIndex> {
        definition.validate()?;

        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        if indexes.contains_key(&definition.name) {
            return Err(StoreError::IndexExists(definition.name.clone()));
        }

        let index = MemoryIndex {
            definition: Arc::new(definition.clone()),
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        };
        indexes.insert(definition.name.clone(), index.clone());

        tracing::debug!(index = %definition.name, "created in-memory index");
        Ok(index)
    }
}

#[async_trait]
impl SegmentIndex for MemoryIndex {
    fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    async fn truncate(&self) -> Result<()> {
        let mut rows = self.write()?;
        tracing::debug!(index = %self.definition.name, removed = rows.len(), "truncated index");
        rows.clear();
        Ok(())
    }

    async fn insert_segment(&self, segment: &Segment) -> Result<String> {
        let row = resolve_segment(&self.definition, segment)?;
        self.write()?.insert(row.key.clone(), row.values);
        Ok(row.key)
    }

    async fn delete_segment(&self, key: &str) -> Result<bool> {
        let key = key_string(&key_value(&self.definition, key)?);
        Ok(self.write()?.remove(&key).is_some())
    }

    async fn lookup(&self, lookup: &Lookup) -> Result<KeyIter> {
        let constraints = resolve_lookup(&self.definition, lookup)?;
        let rows = self.read()?;

        let keys: Vec<String> = rows
            .iter()
            .filter(|(_, values)| {
                constraints
                    .iter()
                    .all(|(position, value)| values[*position] == *value)
            })
            .map(|(key, _)| key.clone())
            .collect();

        Ok(Box::new(keys.into_iter().map(Ok)))
    }

    async fn segments(&self) -> Result<SegmentIter> {
        let snapshot: Vec<Vec<FieldValue>> = self.read()?.values().cloned().collect();
        let definition = Arc::clone(&self.definition);

        Ok(Box::new(
            snapshot
                .into_iter()
                .map(move |values| Ok(to_segment(&definition, values))),
        ))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
