//! # sqadapter
//!
//! Persists authorization policy rules in an indexed segment store.
//!
//! ## Overview
//!
//! The [`Adapter`] sits between a policy model and a segment database:
//!
//! - **Load**: every stored record is decoded into a policy line and fed to the model
//! - **Save**: the index is truncated and every `p`/`g` rule of the model is written
//! - **Add / Remove**: single rules, addressed by their content hash
//! - **Filtered remove**: bulk deletion by exact-match constraints on one ptype
//!
//! ## Key Concepts
//!
//! - **Record**: The 8-field storable form of a rule (`id`, `ptype`, `v0`..`v5`).
//! - **Rule id**: XXH3-128 of `ptype` and the values joined with `,`, in hex.
//!   The same rule always lands on the same record.
//! - **Wildcard**: An empty value in a filter matches anything.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqadapter::{Adapter, AdapterConfig};
//! use sqadapter::model::Model;
//! use sqadapter::store::SqliteDatabase;
//!
//! async fn example() {
//!     let db = SqliteDatabase::open("rules.db").unwrap();
//!     let adapter = Adapter::new(db, AdapterConfig::default()).await.unwrap();
//!
//!     adapter.add_policy("p", "p", &["alice", "data1", "read"]).await.unwrap();
//!
//!     let mut model = Model::new();
//!     adapter.load_policy(&mut model).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sqadapter::core` - Rule ids, record codec, filters, segment shapes
//! - `sqadapter::store` - Store traits, SQLite and in-memory databases
//! - `sqadapter::model` - The policy model the adapter loads into and saves from

pub mod adapter;
pub mod config;
pub mod error;

// Re-export component crates
pub use sqadapter_core as core;
pub use sqadapter_model as model;
pub use sqadapter_store as store;

// Re-export main types for convenience
pub use adapter::Adapter;
pub use config::AdapterConfig;
pub use error::{AdapterError, Result};

// Re-export commonly used core types
pub use sqadapter_core::{rule_id, LineFormat, Record, RuleId};
pub use sqadapter_model::{Model, PolicyModel};
