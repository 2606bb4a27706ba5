//! Checks shared by the store implementations.
//!
//! Both stores keep rows as values in definition order, so segments and
//! lookups are resolved against the definition before they touch storage.

use sqadapter_core::{FieldValue, IndexDefinition, Lookup, ScalarType, Segment};

use crate::error::{Result, StoreError};

/// A segment resolved against its index definition.
pub(crate) struct Row {
    pub key: String,
    pub values: Vec<FieldValue>,
}

/// Position of the primary field.
pub(crate) fn primary_position(definition: &IndexDefinition) -> Result<usize> {
    definition
        .fields
        .iter()
        .position(|f| f.is_primary)
        .ok_or_else(|| {
            StoreError::SchemaMismatch(format!("index {} has no primary field", definition.name))
        })
}

/// Render a primary key value as the string key handed back to callers.
pub(crate) fn key_string(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        FieldValue::Int64(i) => i.to_string(),
    }
}

/// Parse a caller-supplied key into the primary field's type.
pub(crate) fn key_value(definition: &IndexDefinition, key: &str) -> Result<FieldValue> {
    let primary = &definition.fields[primary_position(definition)?];
    match primary.data_type {
        ScalarType::String => Ok(FieldValue::String(key.to_string())),
        ScalarType::Int64 => key.parse().map(FieldValue::Int64).map_err(|_| {
            StoreError::SchemaMismatch(format!("key {:?} is not an int64", key))
        }),
    }
}

/// Order a segment's values by definition, filling undeclared gaps with
/// type defaults.
pub(crate) fn resolve_segment(definition: &IndexDefinition, segment: &Segment) -> Result<Row> {
    let mut values: Vec<Option<FieldValue>> = vec![None; definition.fields.len()];

    for field in &segment.fields {
        let position = definition
            .fields
            .iter()
            .position(|f| f.name == field.name)
            .ok_or_else(|| {
                StoreError::SchemaMismatch(format!(
                    "field {} is not declared by index {}",
                    field.name, definition.name
                ))
            })?;

        let declared = definition.fields[position].data_type;
        if field.value.scalar_type() != declared {
            return Err(StoreError::SchemaMismatch(format!(
                "field {} expects {}, got {}",
                field.name,
                declared.name(),
                field.value.scalar_type().name()
            )));
        }

        if values[position].replace(field.value.clone()).is_some() {
            return Err(StoreError::SchemaMismatch(format!(
                "field {} given twice",
                field.name
            )));
        }
    }

    let primary = primary_position(definition)?;
    let key = match &values[primary] {
        Some(value) => key_string(value),
        None => String::new(),
    };
    if key.is_empty() {
        return Err(StoreError::SchemaMismatch(format!(
            "segment has no {} value",
            definition.fields[primary].name
        )));
    }

    let values = values
        .into_iter()
        .zip(&definition.fields)
        .map(|(value, field)| value.unwrap_or_else(|| field.data_type.default_value()))
        .collect();

    Ok(Row { key, values })
}

/// Resolve lookup constraints to `(position, value)` pairs.
pub(crate) fn resolve_lookup(
    definition: &IndexDefinition,
    lookup: &Lookup,
) -> Result<Vec<(usize, FieldValue)>> {
    lookup
        .fields
        .iter()
        .map(|constraint| {
            let position = definition
                .fields
                .iter()
                .position(|f| f.name == constraint.name)
                .ok_or_else(|| {
                    StoreError::SchemaMismatch(format!(
                        "lookup field {} is not declared by index {}",
                        constraint.name, definition.name
                    ))
                })?;

            let declared = definition.fields[position].data_type;
            if constraint.value.scalar_type() != declared {
                return Err(StoreError::SchemaMismatch(format!(
                    "lookup field {} expects {}",
                    constraint.name,
                    declared.name()
                )));
            }

            Ok((position, constraint.value.clone()))
        })
        .collect()
}

/// Rebuild a segment from values in definition order.
pub(crate) fn to_segment(definition: &IndexDefinition, values: Vec<FieldValue>) -> Segment {
    let mut segment = Segment::new();
    for (field, value) in definition.fields.iter().zip(values) {
        segment = segment.with_field(field.name.as_str(), value);
    }
    segment
}
