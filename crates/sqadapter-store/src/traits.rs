//! Store traits: the abstract interface to an indexed segment store.
//!
//! The adapter only needs named indexes, whole-index truncation, keyed
//! insert/delete, equality lookups and full scans. Implementations include
//! SQLite and in-memory (for tests).

use async_trait::async_trait;
use sqadapter_core::{IndexDefinition, Lookup, Segment};

use crate::error::Result;

/// Primary keys yielded by a lookup.
pub type KeyIter = Box<dyn Iterator<Item = Result<String>> + Send>;

/// Segments yielded by a full scan.
pub type SegmentIter = Box<dyn Iterator<Item = Result<Segment>> + Send>;

/// A segment database holding named indexes.
#[async_trait]
pub trait Database: Send + Sync {
    /// Handle to one index of this database.
    type Index: SegmentIndex;

    /// Resolve an existing index. `None` when no index has that name.
    async fn index_by_name(&self, name: &str) -> Result<Option<Self::Index>>;

    /// Create an index from its definition.
    ///
    /// Fails with `IndexExists` if the name is taken.
    async fn create_index(&self, definition: &IndexDefinition) -> Result<Self::Index>;
}

/// One index of a segment database.
///
/// # Design Notes
///
/// - **Upsert**: inserting a segment whose primary key exists replaces it.
/// - **Quiet deletes**: deleting an absent key returns `Ok(false)`.
/// - **Snapshots**: `lookup` and `segments` iterate over the state at call
///   time; mutating the index while iterating is safe. Calling `segments`
///   again restarts the scan.
#[async_trait]
pub trait SegmentIndex: Send + Sync {
    /// The definition this index was created with.
    fn definition(&self) -> &IndexDefinition;

    /// Remove every segment.
    async fn truncate(&self) -> Result<()>;

    /// Insert or replace a segment, returning its primary key.
    async fn insert_segment(&self, segment: &Segment) -> Result<String>;

    /// Delete by primary key. Returns whether a segment was removed.
    async fn delete_segment(&self, key: &str) -> Result<bool>;

    /// Primary keys of segments matching every lookup constraint.
    async fn lookup(&self, lookup: &Lookup) -> Result<KeyIter>;

    /// Every segment, ordered by primary key.
    async fn segments(&self) -> Result<SegmentIter>;

    /// Number of stored segments.
    async fn count(&self) -> Result<usize>;
}

/// Extension trait for common index patterns.
pub trait SegmentIndexExt: SegmentIndex {
    /// Run a lookup and collect the keys, failing on the first error.
    fn lookup_keys(
        &self,
        lookup: &Lookup,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    /// Collect a full scan, failing on the first error.
    fn all_segments(&self) -> impl std::future::Future<Output = Result<Vec<Segment>>> + Send;
}

impl<I: SegmentIndex + ?Sized> SegmentIndexExt for I {
    async fn lookup_keys(&self, lookup: &Lookup) -> Result<Vec<String>> {
        self.lookup(lookup).await?.collect()
    }

    async fn all_segments(&self) -> Result<Vec<Segment>> {
        self.segments().await?.collect()
    }
}
