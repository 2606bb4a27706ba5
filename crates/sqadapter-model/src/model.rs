//! In-memory policy model.
//!
//! Rules are grouped into sections (`p` for permissions, `g` for role
//! assignments) and, within a section, by ptype. The persistence adapter
//! reads whole sections on save and feeds policy lines back on load.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ModelError, Result};
use crate::line::parse_policy_line;

/// Section holding permission rules.
pub const SECTION_POLICY: &str = "p";

/// Section holding role-assignment rules.
pub const SECTION_ROLE: &str = "g";

/// What the persistence adapter needs from a policy model.
pub trait PolicyModel {
    /// Rule families of a section as `(ptype, rules)`, ordered by ptype.
    fn policies(&self, sec: &str) -> Vec<(String, Vec<Vec<String>>)>;

    /// Parse a policy line and add its rule.
    fn load_policy_line(&mut self, line: &str) -> Result<()>;
}

/// Section a ptype belongs to, by its first character.
pub fn section_of(ptype: &str) -> Result<&'static str> {
    match ptype.chars().next() {
        Some('p') => Ok(SECTION_POLICY),
        Some('g') => Ok(SECTION_ROLE),
        _ => Err(ModelError::UnknownSection(ptype.to_string())),
    }
}

/// Rules of one ptype in insertion order.
#[derive(Debug, Clone, Default)]
struct PolicySet {
    rules: Vec<Vec<String>>,
    /// Index: rule -> position in `rules`.
    positions: HashMap<Vec<String>, usize>,
}

impl PolicySet {
    fn insert(&mut self, rule: Vec<String>) -> bool {
        if self.positions.contains_key(&rule) {
            return false;
        }
        self.positions.insert(rule.clone(), self.rules.len());
        self.rules.push(rule);
        true
    }

    fn remove(&mut self, rule: &[String]) -> bool {
        let Some(position) = self.positions.remove(rule) else {
            return false;
        };
        self.rules.remove(position);
        for p in self.positions.values_mut() {
            if *p > position {
                *p -= 1;
            }
        }
        true
    }

    fn clear(&mut self) {
        self.rules.clear();
        self.positions.clear();
    }
}

/// A policy model with declared ptypes.
#[derive(Debug, Clone)]
pub struct Model {
    /// section -> ptype -> rules.
    sections: BTreeMap<&'static str, BTreeMap<String, PolicySet>>,
}

impl Model {
    /// A model declaring the `p` and `g` ptypes.
    pub fn new() -> Self {
        let mut model = Self::empty();
        model.declare(SECTION_POLICY, "p");
        model.declare(SECTION_ROLE, "g");
        model
    }

    /// A model declaring the given ptypes.
    pub fn with_ptypes(ptypes: &[&str]) -> Result<Self> {
        let mut model = Self::empty();
        for ptype in ptypes {
            model.declare(section_of(ptype)?, ptype);
        }
        Ok(model)
    }

    fn declare(&mut self, sec: &'static str, ptype: &str) {
        self.sections
            .entry(sec)
            .or_default()
            .entry(ptype.to_string())
            .or_default();
    }

    fn empty() -> Self {
        Self {
            sections: BTreeMap::new(),
        }
    }

    fn set_mut(&mut self, sec: &str, ptype: &str) -> Result<&mut PolicySet> {
        if section_of(ptype)? != sec {
            return Err(ModelError::UnknownSection(ptype.to_string()));
        }
        self.sections
            .get_mut(sec)
            .and_then(|ptypes| ptypes.get_mut(ptype))
            .ok_or_else(|| ModelError::UnknownPtype(ptype.to_string()))
    }

    /// Add a rule. Returns `false` if it was already present.
    pub fn add_policy(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> Result<bool> {
        Ok(self.set_mut(sec, ptype)?.insert(rule))
    }

    /// Remove a rule. Returns `false` if it was absent.
    pub fn remove_policy(&mut self, sec: &str, ptype: &str, rule: &[String]) -> bool {
        self.set_mut(sec, ptype)
            .map(|set| set.remove(rule))
            .unwrap_or(false)
    }

    /// Whether the rule is present.
    pub fn has_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> bool {
        self.sections
            .get(sec)
            .and_then(|ptypes| ptypes.get(ptype))
            .is_some_and(|set| set.positions.contains_key(rule))
    }

    /// Rules of one ptype in insertion order.
    pub fn get_policy(&self, sec: &str, ptype: &str) -> &[Vec<String>] {
        self.sections
            .get(sec)
            .and_then(|ptypes| ptypes.get(ptype))
            .map(|set| set.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Declared ptypes of a section.
    pub fn ptypes(&self, sec: &str) -> Vec<&str> {
        self.sections
            .get(sec)
            .map(|ptypes| ptypes.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Total number of rules across all sections.
    pub fn rule_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|ptypes| ptypes.values())
            .map(|set| set.rules.len())
            .sum()
    }

    /// Drop every rule, keeping the declared ptypes.
    pub fn clear_policy(&mut self) {
        for set in self.sections.values_mut().flat_map(|p| p.values_mut()) {
            set.clear();
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyModel for Model {
    fn policies(&self, sec: &str) -> Vec<(String, Vec<Vec<String>>)> {
        self.sections
            .get(sec)
            .map(|ptypes| {
                ptypes
                    .iter()
                    .map(|(ptype, set)| (ptype.clone(), set.rules.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn load_policy_line(&mut self, line: &str) -> Result<()> {
        let Some(parsed) = parse_policy_line(line) else {
            return Ok(());
        };
        if parsed.rule.is_empty() {
            return Err(ModelError::EmptyRule(parsed.ptype));
        }

        let sec = section_of(&parsed.ptype)?;
        self.add_policy(sec, &parsed.ptype, parsed.rule)?;
        Ok(())
    }
}
