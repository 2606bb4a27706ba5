//! Segment store wire shapes.
//!
//! An index is a named table with a fixed list of typed fields, one of which
//! is the primary key. A segment is one row of an index; a lookup is a
//! conjunction of equality constraints over an index's fields.

use serde::{Deserialize, Serialize};

use crate::codec::FIELD_NAMES;
use crate::error::{CoreError, Result};

/// Index name used when none is configured.
pub const DEFAULT_INDEX_NAME: &str = "casbin_rule";

/// Maximum length of index and field names.
const MAX_NAME_LEN: usize = 64;

/// Scalar type of an index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Int64,
}

impl ScalarType {
    /// The zero value stored for a declared field a segment leaves out.
    pub fn default_value(self) -> FieldValue {
        match self {
            ScalarType::String => FieldValue::String(String::new()),
            ScalarType::Int64 => FieldValue::Int64(0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int64 => "int64",
        }
    }
}

/// One field of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub data_type: ScalarType,
    pub is_primary: bool,
}

impl FieldDefinition {
    /// A non-primary string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: ScalarType::String,
            is_primary: false,
        }
    }

    /// Mark this field as the primary key.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// Definition of a named index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl IndexDefinition {
    /// The primary key field, if exactly one is declared.
    pub fn primary_field(&self) -> Option<&FieldDefinition> {
        let mut primaries = self.fields.iter().filter(|f| f.is_primary);
        match (primaries.next(), primaries.next()) {
            (Some(field), None) => Some(field),
            _ => None,
        }
    }

    /// Check the definition is usable by a store.
    ///
    /// Names must be identifier-safe, field names unique, and exactly one
    /// field must be primary.
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)?;

        if self.fields.is_empty() {
            return Err(CoreError::InvalidSchema(format!(
                "index {} declares no fields",
                self.name
            )));
        }

        for (i, field) in self.fields.iter().enumerate() {
            check_name(&field.name)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CoreError::InvalidSchema(format!(
                    "field {} declared twice",
                    field.name
                )));
            }
        }

        match self.fields.iter().filter(|f| f.is_primary).count() {
            1 => Ok(()),
            n => Err(CoreError::InvalidSchema(format!(
                "index {} declares {} primary fields, expected 1",
                self.name, n
            ))),
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if starts_ok && rest_ok && name.len() <= MAX_NAME_LEN {
        Ok(())
    } else {
        Err(CoreError::InvalidSchema(format!("invalid name {:?}", name)))
    }
}

/// The policy rule schema: `id` (primary), `ptype`, `v0`..`v5`, all strings.
///
/// Field order and types must match existing stored data exactly.
pub fn default_index_definition(name: impl Into<String>) -> IndexDefinition {
    let fields = FIELD_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let field = FieldDefinition::string(*name);
            if i == 0 {
                field.primary()
            } else {
                field
            }
        })
        .collect();

    IndexDefinition {
        name: name.into(),
        fields,
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldValue {
    String(String),
    Int64(i64),
}

impl FieldValue {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldValue::String(_) => ScalarType::String,
            FieldValue::Int64(_) => ScalarType::Int64,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            FieldValue::Int64(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

/// A named value inside a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentField {
    pub name: String,
    pub value: FieldValue,
}

/// One stored row of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub fields: Vec<SegmentField>,
}

impl Segment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(SegmentField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// One equality constraint of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupField {
    pub name: String,
    pub value: FieldValue,
}

/// Conjunctive equality query over an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub fields: Vec<LookupField>,
}
