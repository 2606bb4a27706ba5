//! Adapter configuration.

use serde::{Deserialize, Serialize};
use sqadapter_core::{LineFormat, DEFAULT_INDEX_NAME};

/// Configuration for the [`Adapter`](crate::Adapter).
///
/// Every field has a default, so a partial config deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Name of the index holding policy records.
    pub index_name: String,
    /// How empty values are handled when records are loaded back as lines.
    pub line_format: LineFormat,
}

impl AdapterConfig {
    /// Use a different index name.
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Use a different line format on load.
    pub fn with_line_format(mut self, format: LineFormat) -> Self {
        self.line_format = format;
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            line_format: LineFormat::StopAtFirstEmpty,
        }
    }
}
