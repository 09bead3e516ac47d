//! Extracted field record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cleaned field values produced for one processed document.
///
/// Serializes as a flat JSON object keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: BTreeMap<String, String>,
}

impl ExtractedRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field names in name order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Merge another record into this one. Fields from `other` win.
    pub fn merge(&mut self, other: ExtractedRecord) {
        self.fields.extend(other.fields);
    }

    /// Consume the record into its underlying map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl FromIterator<(String, String)> for ExtractedRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ExtractedRecord {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_flat() {
        let mut record = ExtractedRecord::new();
        record.insert("name", "John Doe");
        record.insert("id_number", "1234567890");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id_number":"1234567890","name":"John Doe"}"#);
    }

    #[test]
    fn test_merge_prefers_incoming() {
        let mut front = ExtractedRecord::new();
        front.insert("name", "John Doe");
        front.insert("address", "old");

        let mut back = ExtractedRecord::new();
        back.insert("address", "1 Main St.");

        front.merge(back);
        assert_eq!(front.len(), 2);
        assert_eq!(front.get("address"), Some("1 Main St."));
    }
}
