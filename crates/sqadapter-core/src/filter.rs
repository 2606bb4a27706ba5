//! Filter criteria for partial-match bulk deletion.
//!
//! A filter always pins the `ptype` and optionally pins some of the
//! positional values. Positions are addressed by a starting offset and a
//! run of values; an empty value in the run is a wildcard.

use crate::codec::{Record, FIELD_NAMES, MAX_RULE_VALUES};
use crate::error::{CoreError, Result};
use crate::schema::{Lookup, LookupField};

/// Exact-match constraints over a record.
///
/// Only [`build_filter`] constructs criteria, so every position is a valid
/// index into `v0`..`v5`:
///
/// ```compile_fail
/// use sqadapter_core::FilterCriteria;
///
/// let criteria = FilterCriteria { ptype: "p".into(), constraints: vec![(6, "x".into())] };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    ptype: String,
    /// `(position, value)` pairs, ascending by position, each below
    /// `MAX_RULE_VALUES`.
    constraints: Vec<(usize, String)>,
}

impl FilterCriteria {
    /// The pinned ptype.
    pub fn ptype(&self) -> &str {
        &self.ptype
    }

    /// `(position, value)` pairs, ascending by position.
    pub fn constraints(&self) -> &[(usize, String)] {
        &self.constraints
    }

    /// Render as a store lookup, `ptype` first.
    pub fn to_lookup(&self) -> Lookup {
        let mut fields = Vec::with_capacity(1 + self.constraints.len());
        fields.push(LookupField {
            name: FIELD_NAMES[1].to_string(),
            value: self.ptype.as_str().into(),
        });
        for (position, value) in &self.constraints {
            fields.push(LookupField {
                name: FIELD_NAMES[2 + position].to_string(),
                value: value.as_str().into(),
            });
        }
        Lookup { fields }
    }

    /// Whether `record` satisfies every constraint.
    pub fn matches(&self, record: &Record) -> bool {
        record.ptype == self.ptype
            && self
                .constraints
                .iter()
                .all(|(position, value)| record.values[*position] == *value)
    }
}

/// Build the criteria selecting records of `ptype` whose values starting at
/// `field_offset` equal `field_values`.
///
/// Fails with [`CoreError::InvalidArgument`] when the run would reach past
/// `v5`.
pub fn build_filter<S: AsRef<str>>(
    ptype: &str,
    field_offset: usize,
    field_values: &[S],
) -> Result<FilterCriteria> {
    let in_range = field_offset
        .checked_add(field_values.len())
        .is_some_and(|end| end <= MAX_RULE_VALUES);
    if !in_range {
        return Err(CoreError::InvalidArgument {
            offset: field_offset,
            len: field_values.len(),
            max: MAX_RULE_VALUES,
        });
    }

    let constraints = field_values
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(i, value)| (field_offset + i, value.as_ref().to_string()))
        .collect();

    Ok(FilterCriteria {
        ptype: ptype.to_string(),
        constraints,
    })
}
