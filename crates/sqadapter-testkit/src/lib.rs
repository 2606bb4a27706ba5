//! # sqadapter Testkit
//!
//! Testing utilities for sqadapter.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: An adapter over a fresh memory database, and a stock RBAC policy
//! - **Generators**: Proptest strategies for ptypes, rules, rule sets and filters
//! - **Fault injection**: Database wrappers that fail chosen store calls and count them
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sqadapter_testkit::generators::{record_from_params, RuleParams};
//!
//! proptest! {
//!     #[test]
//!     fn rule_id_is_deterministic(params: RuleParams) {
//!         prop_assert_eq!(record_from_params(&params).id, record_from_params(&params).id);
//!     }
//! }
//! ```
//!
//! ## Fault Injection
//!
//! ```rust,no_run
//! use sqadapter::Adapter;
//! use sqadapter_store::MemoryDatabase;
//! use sqadapter_testkit::faulty::{FaultPlan, FaultyDatabase};
//! use sqadapter_testkit::fixtures::rbac_model;
//!
//! async fn example() {
//!     let db = FaultyDatabase::new(MemoryDatabase::new(), FaultPlan::none().insert_at(2));
//!     let adapter = Adapter::with_defaults(db).await.unwrap();
//!     assert!(adapter.save_policy(&rbac_model()).await.is_err());
//! }
//! ```

pub mod faulty;
pub mod fixtures;
pub mod generators;

pub use faulty::{CallCounts, FaultHandle, FaultPlan, FaultyDatabase, FaultyIndex};
pub use fixtures::{model_from_lines, policy_lines, rbac_model, TestFixture, RBAC_POLICY};
pub use generators::{record_from_params, RuleParams};
