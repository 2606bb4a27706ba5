//! # sqadapter Core
//!
//! Pure primitives for persisting authorization policy rules in an indexed
//! segment store.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! policy rules and the records that represent them.
//!
//! ## Key Types
//!
//! - [`RuleId`] - Content-addressed identifier of a rule (XXH3-128, hex)
//! - [`Record`] - The fixed 8-field storable encoding of one rule
//! - [`FilterCriteria`] - Exact-match constraints for bulk deletion
//! - [`IndexDefinition`] / [`Segment`] / [`Lookup`] - Segment store wire shapes
//!
//! ## Encoding
//!
//! ```rust
//! use sqadapter_core::{encode, rule_id, LineFormat};
//!
//! let rule = ["alice", "data1", "read"];
//! let record = encode("p", &rule);
//! assert_eq!(record.id, rule_id("p", &rule).as_str());
//! assert_eq!(record.policy_line(LineFormat::default()), "p, alice, data1, read");
//! ```

pub mod codec;
pub mod error;
pub mod filter;
pub mod id;
pub mod schema;

pub use codec::{decode, encode, LineFormat, Record, FIELD_NAMES, MAX_RULE_VALUES};
pub use error::{CoreError, DecodeError, Result};
pub use filter::{build_filter, FilterCriteria};
pub use id::{rule_id, RuleId};
pub use schema::{
    default_index_definition, FieldDefinition, FieldValue, IndexDefinition, Lookup, LookupField,
    ScalarType, Segment, SegmentField, DEFAULT_INDEX_NAME,
};
