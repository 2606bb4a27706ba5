//! Rule identifiers.
//!
//! A rule's identifier is the primary key of its record. It is derived from
//! the rule content alone, so saving the same rule twice addresses the same
//! record.

use serde::{Deserialize, Serialize};
use std::fmt;
use twox_hash::xxh3;

use crate::error::{CoreError, Result};

/// Number of hex characters in a rendered identifier (128 bits).
pub const RULE_ID_HEX_LEN: usize = 32;

/// Content-addressed identifier of a policy rule.
///
/// Computed as XXH3-128 over `ptype,v0,v1,...` and rendered as 32 lowercase
/// hex characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Parse an identifier read back from a store.
    pub fn from_hex(s: &str) -> Result<Self> {
        let well_formed = s.len() == RULE_ID_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(CoreError::InvalidRuleId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The hex form, as stored in the `id` field.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleId({})", &self.0[..self.0.len().min(16)])
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<RuleId> for String {
    fn from(id: RuleId) -> Self {
        id.0
    }
}

/// Derive the identifier of a rule.
///
/// Every value takes part, including values past the sixth that a record
/// cannot hold.
pub fn rule_id<S: AsRef<str>>(ptype: &str, values: &[S]) -> RuleId {
    let mut data = String::with_capacity(
        ptype.len() + values.iter().map(|v| v.as_ref().len() + 1).sum::<usize>(),
    );
    data.push_str(ptype);
    for value in values {
        data.push(',');
        data.push_str(value.as_ref());
    }

    let digest = xxh3::hash128(data.as_bytes());
    RuleId(hex::encode(digest.to_be_bytes()))
}
