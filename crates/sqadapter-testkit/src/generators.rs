//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use sqadapter_core::{encode, Record, MAX_RULE_VALUES};

/// Generate a ptype of the `p` or `g` family.
pub fn ptype() -> impl Strategy<Value = String> {
    "[pg][2-9]?".prop_map(String::from)
}

/// Generate a non-empty rule value.
pub fn rule_value() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}".prop_map(String::from)
}

/// Generate a rule of 1 to 6 non-empty values.
pub fn rule() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(rule_value(), 1..=MAX_RULE_VALUES)
}

/// Generate a rule that may contain empty values and may run past `v5`.
pub fn loose_rule() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![3 => rule_value(), 1 => Just(String::new())],
        0..=MAX_RULE_VALUES + 3,
    )
}

/// Generate a set of distinct rules.
pub fn rule_set(max_len: usize) -> impl Strategy<Value = BTreeSet<Vec<String>>> {
    prop::collection::btree_set(rule(), 0..=max_len)
}

/// Generate a filter: an offset and a run of values that fits in `v0`..`v5`.
/// Empty values are wildcards.
pub fn filter() -> impl Strategy<Value = (usize, Vec<String>)> {
    (0..=MAX_RULE_VALUES).prop_flat_map(|offset| {
        let values = prop::collection::vec(
            prop_oneof![2 => rule_value(), 1 => Just(String::new())],
            0..=MAX_RULE_VALUES - offset,
        );
        (Just(offset), values)
    })
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RuleParams {
    pub ptype: String,
    pub values: Vec<String>,
}

impl Arbitrary for RuleParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (ptype(), rule())
            .prop_map(|(ptype, values)| RuleParams { ptype, values })
            .boxed()
    }
}

/// Encode a record from parameters.
pub fn record_from_params(params: &RuleParams) -> Record {
    encode(&params.ptype, &params.values)
}
