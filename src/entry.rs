//! Source and reference entry records
//!
//! Entries own their parsed value plus the exact text the user supplied;
//! reference entries additionally carry inventory metadata. The index and
//! engine only ever borrow these.

use crate::address::AddressValue;
use serde::Serialize;

/// One parsed source token
#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    /// Parsed value
    #[serde(skip)]
    pub value: AddressValue,
    /// Exact user input, preserved for display
    pub original: String,
}

impl SourceEntry {
    /// Create an entry from a parsed token
    pub fn new(value: AddressValue, original: impl Into<String>) -> Self {
        SourceEntry {
            value,
            original: original.into(),
        }
    }
}

/// One reference entry with inventory metadata
///
/// Metadata fields default to empty strings; only the tabular import
/// populates anything beyond `network_name`.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceEntry {
    /// Parsed value
    #[serde(skip)]
    pub value: AddressValue,
    /// Display name; for text-sourced references this is the raw token
    pub network_name: String,
    /// Site or location annotation
    pub location: String,
    /// Category annotation
    pub category: String,
    /// Object name from tabular import
    pub object_name: String,
    /// Network identifier from tabular import
    pub network_id: String,
    /// Free-form attributes from tabular import
    pub attributes: String,
}

impl ReferenceEntry {
    /// Reference entry from a raw text token: name is the token itself,
    /// everything else empty
    pub fn from_token(value: AddressValue, token: impl Into<String>) -> Self {
        ReferenceEntry {
            value,
            network_name: token.into(),
            location: String::new(),
            category: String::new(),
            object_name: String::new(),
            network_id: String::new(),
            attributes: String::new(),
        }
    }

    /// Canonical CIDR/range text of the parsed value
    pub fn cidr_text(&self) -> String {
        self.value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_leaves_metadata_empty() {
        let e = ReferenceEntry::from_token(AddressValue::network(0x0A00_0000, 8), "10.0.0.0/8");
        assert_eq!(e.network_name, "10.0.0.0/8");
        assert!(e.location.is_empty());
        assert!(e.category.is_empty());
        assert!(e.object_name.is_empty());
        assert!(e.network_id.is_empty());
        assert!(e.attributes.is_empty());
    }

    #[test]
    fn test_cidr_text_uses_parsed_value() {
        let e = ReferenceEntry::from_token(AddressValue::network(0x0A01_0203, 24), "10.1.2.3/24");
        assert_eq!(e.cidr_text(), "10.1.2.0/24");
    }
}
