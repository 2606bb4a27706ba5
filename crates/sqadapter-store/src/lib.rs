//! # sqadapter Store
//!
//! Storage abstraction for sqadapter. Provides a trait-based interface to an
//! indexed segment store with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! A [`Database`] holds named indexes. Each [`SegmentIndex`] stores
//! segments (rows) under a schema of typed fields with one primary key, and
//! answers equality lookups with primary keys.
//!
//! ## Key Types
//!
//! - [`Database`] / [`SegmentIndex`] - The async traits for all store operations
//! - [`SqliteDatabase`] - SQLite-based persistent storage
//! - [`MemoryDatabase`] - In-memory storage for tests
//! - [`KeyIter`] / [`SegmentIter`] - Snapshot iterators over lookups and scans
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqadapter_core::{default_index_definition, encode};
//! use sqadapter_store::{Database, SegmentIndex, SqliteDatabase};
//!
//! async fn example() {
//!     let db = SqliteDatabase::open("rules.db").unwrap();
//!     let index = db
//!         .create_index(&default_index_definition("casbin_rule"))
//!         .await
//!         .unwrap();
//!
//!     let record = encode("p", &["alice", "data1", "read"]);
//!     index.insert_segment(&record.to_segment()).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Upsert inserts**: a segment with an existing primary key replaces it
//! - **Quiet deletes**: deleting a missing key is not an error
//! - **Snapshot iteration**: lookups and scans are unaffected by later writes

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;
mod validate;

pub use error::{Result, StoreError};
pub use memory::{MemoryDatabase, MemoryIndex};
pub use sqlite::{SqliteDatabase, SqliteIndex};
pub use traits::{Database, KeyIter, SegmentIndex, SegmentIndexExt, SegmentIter};
