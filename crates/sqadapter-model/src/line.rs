//! Policy line parsing.
//!
//! A policy line is the flattened text form of one rule, `ptype, v0, v1, ...`.

use serde::{Deserialize, Serialize};

/// One parsed policy line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLine {
    pub ptype: String,
    pub rule: Vec<String>,
}

/// Parse a policy line.
///
/// Returns `None` for blank lines and `#` comments. Tokens are split on `,`
/// and trimmed, so interior empty values survive as `""`.
pub fn parse_policy_line(line: &str) -> Option<PolicyLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut tokens = line.split(',').map(|t| t.trim().to_string());
    let ptype = tokens.next()?;
    Some(PolicyLine {
        ptype,
        rule: tokens.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_line() {
        let parsed = parse_policy_line("p, alice, data1, read").unwrap();
        assert_eq!(parsed.ptype, "p");
        assert_eq!(parsed.rule, ["alice", "data1", "read"]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse_policy_line("  g ,alice,   data2_admin  ").unwrap();
        assert_eq!(parsed.ptype, "g");
        assert_eq!(parsed.rule, ["alice", "data2_admin"]);
    }

    #[test]
    fn test_parse_keeps_interior_empty() {
        let parsed = parse_policy_line("p, alice, , read").unwrap();
        assert_eq!(parsed.rule, ["alice", "", "read"]);
    }

    #[test]
    fn test_parse_skips_blank_and_comments() {
        assert!(parse_policy_line("").is_none());
        assert!(parse_policy_line("   ").is_none());
        assert!(parse_policy_line("# p, alice, data1, read").is_none());
    }

    #[test]
    fn test_parse_bare_ptype() {
        let parsed = parse_policy_line("p").unwrap();
        assert_eq!(parsed.ptype, "p");
        assert!(parsed.rule.is_empty());
    }

    proptest! {
        #[test]
        fn joined_tokens_parse_back(ptype in "[pg][0-9]?", rule in prop::collection::vec("[a-z0-9_]{0,8}", 0..6)) {
            let mut line = ptype.clone();
            for value in &rule {
                line.push_str(", ");
                line.push_str(value);
            }
            let parsed = parse_policy_line(&line).unwrap();
            prop_assert_eq!(parsed.ptype, ptype);
            prop_assert_eq!(parsed.rule, rule);
        }
    }
}
