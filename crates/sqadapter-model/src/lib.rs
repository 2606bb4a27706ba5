//! # sqadapter Model
//!
//! The policy model the persistence adapter reads from and loads into.
//!
//! ## Overview
//!
//! A policy model groups rules into two sections: `p` (permission rules)
//! and `g` (role-assignment rules). Each section holds one or more ptypes
//! (`p`, `p2`, `g`, `g2`, ...), and each ptype an ordered list of rules.
//!
//! The adapter depends only on the [`PolicyModel`] trait. [`Model`] is a
//! plain in-memory implementation suitable for tests and small services.
//!
//! ## Usage
//!
//! ```rust
//! use sqadapter_model::{Model, PolicyModel};
//!
//! let mut model = Model::new();
//! model.load_policy_line("p, alice, data1, read").unwrap();
//! model.load_policy_line("g, alice, data2_admin").unwrap();
//!
//! assert_eq!(model.policies("p")[0].1.len(), 1);
//! ```

pub mod error;
pub mod line;
pub mod model;

pub use error::{ModelError, Result};
pub use line::{parse_policy_line, PolicyLine};
pub use model::{section_of, Model, PolicyModel, SECTION_POLICY, SECTION_ROLE};
