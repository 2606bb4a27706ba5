//! Fault injection for store-failure tests.
//!
//! [`FaultyDatabase`] wraps any [`Database`] and hands out [`FaultyIndex`]
//! handles that fail chosen calls and count every call. Call numbers are
//! zero-based and counted per operation across all handles of the database.
//! A [`FaultHandle`] keeps reading the counts after the database has been
//! moved into an adapter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqadapter_core::{IndexDefinition, Lookup, Segment};
use sqadapter_store::{Database, KeyIter, Result, SegmentIndex, SegmentIter, StoreError};

/// Which calls fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Fail every `index_by_name` call.
    pub fail_resolve: bool,
    /// Fail every `create_index` call.
    pub fail_create: bool,
    /// Fail the n-th `insert_segment` call.
    pub fail_insert_at: Option<usize>,
    /// Fail the n-th `delete_segment` call.
    pub fail_delete_at: Option<usize>,
    /// Yield an error in place of the n-th item of every scan.
    pub fail_scan_item_at: Option<usize>,
}

impl FaultPlan {
    /// Fail nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Fail index resolution.
    pub fn resolve_fails(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    /// Fail index creation.
    pub fn create_fails(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Fail the n-th insert.
    pub fn insert_at(mut self, n: usize) -> Self {
        self.fail_insert_at = Some(n);
        self
    }

    /// Fail the n-th delete.
    pub fn delete_at(mut self, n: usize) -> Self {
        self.fail_delete_at = Some(n);
        self
    }

    /// Fail the n-th item of each scan.
    pub fn scan_item_at(mut self, n: usize) -> Self {
        self.fail_scan_item_at = Some(n);
        self
    }
}

/// Snapshot of per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub resolve: usize,
    pub create: usize,
    pub truncate: usize,
    pub insert: usize,
    pub delete: usize,
    pub lookup: usize,
    pub scan: usize,
}

impl CallCounts {
    /// Calls of any kind.
    pub fn total(&self) -> usize {
        self.resolve + self.create + self.index_calls()
    }

    /// Calls made through index handles.
    pub fn index_calls(&self) -> usize {
        self.truncate + self.insert + self.delete + self.lookup + self.scan
    }
}

#[derive(Debug, Default)]
struct Faults {
    plan: FaultPlan,
    resolve: AtomicUsize,
    create: AtomicUsize,
    truncate: AtomicUsize,
    insert: AtomicUsize,
    delete: AtomicUsize,
    lookup: AtomicUsize,
    scan: AtomicUsize,
}

impl Faults {
    fn counts(&self) -> CallCounts {
        CallCounts {
            resolve: self.resolve.load(Ordering::SeqCst),
            create: self.create.load(Ordering::SeqCst),
            truncate: self.truncate.load(Ordering::SeqCst),
            insert: self.insert.load(Ordering::SeqCst),
            delete: self.delete.load(Ordering::SeqCst),
            lookup: self.lookup.load(Ordering::SeqCst),
            scan: self.scan.load(Ordering::SeqCst),
        }
    }
}

fn injected(op: &str, n: usize) -> StoreError {
    StoreError::Task(format!("injected {op} fault at call {n}"))
}

/// A database whose indexes fail according to a [`FaultPlan`].
pub struct FaultyDatabase<D> {
    inner: D,
    faults: Arc<Faults>,
}

impl<D: Database> FaultyDatabase<D> {
    /// Wrap a database.
    pub fn new(inner: D, plan: FaultPlan) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults {
                plan,
                ..Faults::default()
            }),
        }
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.faults.counts()
    }

    /// A handle that reads the call counts of this database.
    pub fn handle(&self) -> FaultHandle {
        FaultHandle {
            faults: Arc::clone(&self.faults),
        }
    }
}

/// Reads the call counts of a [`FaultyDatabase`] from outside it.
#[derive(Debug, Clone)]
pub struct FaultHandle {
    faults: Arc<Faults>,
}

impl FaultHandle {
    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.faults.counts()
    }
}

#[async_trait]
impl<D: Database> Database for FaultyDatabase<D> {
    type Index = FaultyIndex<D::Index>;

    async fn index_by_name(&self, name: &str) -> Result<Option<Self::Index>> {
        let n = self.faults.resolve.fetch_add(1, Ordering::SeqCst);
        if self.faults.plan.fail_resolve {
            return Err(injected("resolve", n));
        }
        Ok(self
            .inner
            .index_by_name(name)
            .await?
            .map(|inner| FaultyIndex {
                inner,
                faults: Arc::clone(&self.faults),
            }))
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<Self::Index> {
        let n = self.faults.create.fetch_add(1, Ordering::SeqCst);
        if self.faults.plan.fail_create {
            return Err(injected("create", n));
        }
        Ok(FaultyIndex {
            inner: self.inner.create_index(definition).await?,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// An index handle that fails according to its database's [`FaultPlan`].
pub struct FaultyIndex<I> {
    inner: I,
    faults: Arc<Faults>,
}

impl<I> FaultyIndex<I> {
    /// Calls made so far, across every handle of the database.
    pub fn calls(&self) -> CallCounts {
        self.faults.counts()
    }
}

#[async_trait]
impl<I: SegmentIndex> SegmentIndex for FaultyIndex<I> {
    fn definition(&self) -> &IndexDefinition {
        self.inner.definition()
    }

    async fn truncate(&self) -> Result<()> {
        self.faults.truncate.fetch_add(1, Ordering::SeqCst);
        self.inner.truncate().await
    }

    async fn insert_segment(&self, segment: &Segment) -> Result<String> {
        let n = self.faults.insert.fetch_add(1, Ordering::SeqCst);
        if self.faults.plan.fail_insert_at == Some(n) {
            return Err(injected("insert", n));
        }
        self.inner.insert_segment(segment).await
    }

    async fn delete_segment(&self, key: &str) -> Result<bool> {
        let n = self.faults.delete.fetch_add(1, Ordering::SeqCst);
        if self.faults.plan.fail_delete_at == Some(n) {
            return Err(injected("delete", n));
        }
        self.inner.delete_segment(key).await
    }

    async fn lookup(&self, lookup: &Lookup) -> Result<KeyIter> {
        self.faults.lookup.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(lookup).await
    }

    async fn segments(&self) -> Result<SegmentIter> {
        self.faults.scan.fetch_add(1, Ordering::SeqCst);
        let items = self.inner.segments().await?;

        let Some(fail_at) = self.faults.plan.fail_scan_item_at else {
            return Ok(items);
        };
        Ok(Box::new(items.enumerate().map(move |(i, item)| {
            if i == fail_at {
                Err(injected("scan", i))
            } else {
                item
            }
        })))
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqadapter_core::{default_index_definition, encode};
    use sqadapter_store::{MemoryDatabase, SegmentIndexExt};

    #[tokio::test]
    async fn test_insert_fault_fires_once() {
        let db = FaultyDatabase::new(MemoryDatabase::new(), FaultPlan::none().insert_at(1));
        let index = db.create_index(&default_index_definition("rules")).await.unwrap();

        let a = encode("p", &["alice"]).to_segment();
        let b = encode("p", &["bob"]).to_segment();
        assert!(index.insert_segment(&a).await.is_ok());
        assert!(index.insert_segment(&b).await.is_err());
        assert!(index.insert_segment(&b).await.is_ok());

        assert_eq!(index.count().await.unwrap(), 2);
        assert_eq!(db.calls().insert, 3);
    }

    #[tokio::test]
    async fn test_scan_fault_replaces_item() {
        let db = FaultyDatabase::new(MemoryDatabase::new(), FaultPlan::none().scan_item_at(1));
        let index = db.create_index(&default_index_definition("rules")).await.unwrap();
        for user in ["alice", "bob", "carol"] {
            index
                .insert_segment(&encode("p", &[user]).to_segment())
                .await
                .unwrap();
        }

        let items: Vec<_> = index.segments().await.unwrap().collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
        assert!(items[2].is_ok());
        assert!(index.all_segments().await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_and_create_faults() {
        let db = FaultyDatabase::new(MemoryDatabase::new(), FaultPlan::none().resolve_fails());
        assert!(db.index_by_name("rules").await.is_err());
        assert!(db.create_index(&default_index_definition("rules")).await.is_ok());

        let db = FaultyDatabase::new(MemoryDatabase::new(), FaultPlan::none().create_fails());
        assert!(db.create_index(&default_index_definition("rules")).await.is_err());
        assert!(db.index_by_name("rules").await.unwrap().is_none());
        assert_eq!(db.calls().resolve, 1);
        assert_eq!(db.calls().create, 1);
    }

    #[tokio::test]
    async fn test_handles_share_counts() {
        let db = FaultyDatabase::new(MemoryDatabase::new(), FaultPlan::none());
        let created = db.create_index(&default_index_definition("rules")).await.unwrap();
        let resolved = db.index_by_name("rules").await.unwrap().unwrap();

        created.truncate().await.unwrap();
        resolved.delete_segment("missing").await.unwrap();
        assert_eq!(
            created.calls(),
            CallCounts {
                resolve: 1,
                create: 1,
                truncate: 1,
                delete: 1,
                ..CallCounts::default()
            }
        );
        assert_eq!(resolved.calls().index_calls(), 2);
        assert_eq!(db.handle().calls().total(), 4);
    }
}
