//! Rule codec: policy rules to fixed-shape records and back.
//!
//! A record always carries eight string fields, `id`, `ptype` and `v0`..`v5`.
//! Encoding pads short rules with empty strings and drops values past the
//! sixth. Decoding rebuilds the textual policy line `ptype, v0, v1, ...`
//! that the policy model's line loader consumes.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::id::rule_id;
use crate::schema::{FieldValue, Segment};

/// Number of positional values a record holds.
pub const MAX_RULE_VALUES: usize = 6;

/// Record field names in schema order.
pub const FIELD_NAMES: [&str; 2 + MAX_RULE_VALUES] =
    ["id", "ptype", "v0", "v1", "v2", "v3", "v4", "v5"];

/// How empty values are treated when a record is turned back into a line.
///
/// A rule whose `v0` is empty decodes to a bare `ptype` line under
/// `StopAtFirstEmpty`, and to a bare `ptype` line under either format when
/// every value is empty. A policy model that refuses rules without values
/// then fails the whole load on that one record. `TrimTrailingEmpty` keeps
/// such a rule loadable as long as a later value is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// Stop at the first empty value. Values after it are dropped even when
    /// set. Compatible with every record written so far.
    #[default]
    StopAtFirstEmpty,
    /// Drop trailing empty values only, keeping interior empty values.
    TrimTrailingEmpty,
}

/// The storable encoding of one policy rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub ptype: String,
    pub values: [String; MAX_RULE_VALUES],
}

impl Record {
    /// The rule values as they would appear in a policy line.
    pub fn rule(&self, format: LineFormat) -> &[String] {
        let len = match format {
            LineFormat::StopAtFirstEmpty => self
                .values
                .iter()
                .position(String::is_empty)
                .unwrap_or(MAX_RULE_VALUES),
            LineFormat::TrimTrailingEmpty => self
                .values
                .iter()
                .rposition(|v| !v.is_empty())
                .map_or(0, |i| i + 1),
        };
        &self.values[..len]
    }

    /// Render the policy line, `ptype` first, comma-and-space separated.
    pub fn policy_line(&self, format: LineFormat) -> String {
        let mut line = self.ptype.clone();
        for value in self.rule(format) {
            line.push_str(", ");
            line.push_str(value);
        }
        line
    }

    /// Convert to a store segment with fields in schema order.
    pub fn to_segment(&self) -> Segment {
        let mut segment = Segment::new()
            .with_field(FIELD_NAMES[0], self.id.as_str())
            .with_field(FIELD_NAMES[1], self.ptype.as_str());
        for (name, value) in FIELD_NAMES[2..].iter().zip(&self.values) {
            segment = segment.with_field(*name, value.as_str());
        }
        segment
    }
}

impl TryFrom<&Segment> for Record {
    type Error = DecodeError;

    fn try_from(segment: &Segment) -> Result<Self, Self::Error> {
        let mut record = Record::default();
        let mut seen = [false; FIELD_NAMES.len()];

        for field in &segment.fields {
            let slot = FIELD_NAMES
                .iter()
                .position(|n| *n == field.name)
                .ok_or_else(|| DecodeError::UnknownField(field.name.clone()))?;

            if std::mem::replace(&mut seen[slot], true) {
                return Err(DecodeError::DuplicateField(field.name.clone()));
            }

            let value = match &field.value {
                FieldValue::String(s) => s.clone(),
                other => {
                    return Err(DecodeError::UnexpectedType {
                        field: field.name.clone(),
                        expected: "string",
                        actual: other.scalar_type().name(),
                    })
                }
            };

            match slot {
                0 => record.id = value,
                1 => record.ptype = value,
                n => record.values[n - 2] = value,
            }
        }

        if record.ptype.is_empty() {
            return Err(DecodeError::MissingPtype);
        }

        Ok(record)
    }
}

/// Encode a rule into its record.
///
/// The id covers every value, but only the first six are stored.
pub fn encode<S: AsRef<str>>(ptype: &str, values: &[S]) -> Record {
    if values.len() > MAX_RULE_VALUES {
        tracing::debug!(
            ptype,
            len = values.len(),
            "rule has more than {} values, extra values are not stored",
            MAX_RULE_VALUES
        );
    }

    let mut record = Record {
        id: rule_id(ptype, values).into(),
        ptype: ptype.to_string(),
        values: Default::default(),
    };
    for (slot, value) in record.values.iter_mut().zip(values) {
        *slot = value.as_ref().to_string();
    }
    record
}

/// Decode a record into its policy line, stopping at the first empty value.
pub fn decode(record: &Record) -> String {
    record.policy_line(LineFormat::StopAtFirstEmpty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_pads_short_rules() {
        let record = encode("p", &["alice", "data1", "read"]);
        assert_eq!(record.id, rule_id("p", &["alice", "data1", "read"]).as_str());
        assert_eq!(record.ptype, "p");
        assert_eq!(record.values, ["alice", "data1", "read", "", "", ""]);
    }

    #[test]
    fn test_encode_truncates_long_rules() {
        let rule = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let record = encode("p", &rule);
        assert_eq!(record.values, ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(record.id, rule_id("p", &rule).as_str());
    }

    #[test]
    fn test_decode_line() {
        let record = encode("p", &["alice", "data1", "read"]);
        assert_eq!(decode(&record), "p, alice, data1, read");

        let record = encode("g", &["alice", "data2_admin"]);
        assert_eq!(decode(&record), "g, alice, data2_admin");

        let record = encode("p", &[] as &[&str]);
        assert_eq!(decode(&record), "p");
    }

    #[test]
    fn test_decode_stops_at_first_empty() {
        let record = encode("p", &["alice", "", "read"]);
        assert_eq!(decode(&record), "p, alice");
        assert_eq!(record.rule(LineFormat::StopAtFirstEmpty), ["alice"]);
    }

    #[test]
    fn test_trim_trailing_keeps_interior_empty() {
        let record = encode("p", &["alice", "", "read"]);
        assert_eq!(
            record.policy_line(LineFormat::TrimTrailingEmpty),
            "p, alice, , read"
        );
        assert_eq!(
            encode("p", &["", "", ""]).policy_line(LineFormat::TrimTrailingEmpty),
            "p"
        );
    }

    #[test]
    fn test_empty_first_value() {
        let record = encode("p", &["", "x"]);
        assert_eq!(record.policy_line(LineFormat::StopAtFirstEmpty), "p");
        assert_eq!(record.policy_line(LineFormat::TrimTrailingEmpty), "p, , x");

        let blank = encode("p", &[""]);
        assert_eq!(blank.policy_line(LineFormat::TrimTrailingEmpty), "p");
    }

    #[test]
    fn test_segment_conversion() {
        let record = encode("p", &["alice", "data1", "read"]);
        let segment = record.to_segment();

        let names: Vec<&str> = segment.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, FIELD_NAMES);
        assert_eq!(segment.get("v2"), Some(&FieldValue::from("read")));
        assert_eq!(segment.get("v3"), Some(&FieldValue::from("")));

        assert_eq!(Record::try_from(&segment).unwrap(), record);
    }

    #[test]
    fn test_segment_missing_values_decode_empty() {
        let segment = Segment::new()
            .with_field("v0", "alice")
            .with_field("ptype", "g")
            .with_field("v1", "admin");
        let record = Record::try_from(&segment).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(decode(&record), "g, alice, admin");
    }

    #[test]
    fn test_segment_decode_errors() {
        let unknown = Segment::new().with_field("ptype", "p").with_field("v6", "x");
        assert_eq!(
            Record::try_from(&unknown),
            Err(DecodeError::UnknownField("v6".into()))
        );

        let duplicate = Segment::new().with_field("ptype", "p").with_field("ptype", "g");
        assert_eq!(
            Record::try_from(&duplicate),
            Err(DecodeError::DuplicateField("ptype".into()))
        );

        let typed = Segment::new()
            .with_field("ptype", "p")
            .with_field("v0", FieldValue::Int64(7));
        assert!(matches!(
            Record::try_from(&typed),
            Err(DecodeError::UnexpectedType { expected: "string", actual: "int64", .. })
        ));

        let no_ptype = Segment::new().with_field("v0", "alice");
        assert_eq!(Record::try_from(&no_ptype), Err(DecodeError::MissingPtype));
    }

    proptest! {
        #[test]
        fn encode_pads_and_truncates(values in prop::collection::vec("[a-z]{1,6}", 0..10)) {
            let record = encode("p", &values);
            for i in 0..MAX_RULE_VALUES {
                let expected = values.get(i).map(String::as_str).unwrap_or("");
                prop_assert_eq!(record.values[i].as_str(), expected);
            }
        }

        #[test]
        fn non_empty_rules_survive_the_line(values in prop::collection::vec("[a-z0-9_]{1,8}", 0..=6)) {
            let record = encode("p", &values);
            let mut expected = String::from("p");
            for v in &values {
                expected.push_str(", ");
                expected.push_str(v);
            }
            prop_assert_eq!(record.policy_line(LineFormat::StopAtFirstEmpty), expected.clone());
            prop_assert_eq!(record.policy_line(LineFormat::TrimTrailingEmpty), expected);
        }
    }
}
