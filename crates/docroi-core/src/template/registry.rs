//! Read-only registry of templates keyed by document type, subtype and side.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TemplateError;
use crate::models::config::TemplateConfig;
use crate::models::document::{DocumentType, Side, Subtype, TemplateKey};

use super::builtin::BUILTIN_TEMPLATES;
use super::Template;

/// On-disk template file.
#[derive(Debug, Serialize, Deserialize)]
struct TemplateFile {
    templates: Vec<TemplateEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TemplateEntry {
    document_type: DocumentType,
    subtype: Subtype,
    #[serde(default)]
    side: Option<Side>,
    fields: Template,
}

/// Immutable mapping from [`TemplateKey`] to [`Template`].
///
/// Built once through [`TemplateRegistryBuilder`] and shared read-only
/// afterwards; there is no way to add or replace entries after `build()`.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateKey, Template>,
}

impl TemplateRegistry {
    /// Start building a registry.
    pub fn builder() -> TemplateRegistryBuilder {
        TemplateRegistryBuilder::new()
    }

    /// Registry holding only the built-in templates.
    pub fn builtin() -> Result<Self, TemplateError> {
        Ok(Self::builder().with_builtin()?.build())
    }

    /// Registry holding only the templates from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        Ok(Self::builder().with_file(path)?.build())
    }

    /// Registry assembled according to configuration.
    pub fn from_config(config: &TemplateConfig) -> Result<Self, TemplateError> {
        let mut builder = Self::builder();
        if config.include_builtin {
            builder = builder.with_builtin()?;
        }
        if let Some(ref path) = config.path {
            builder = builder.with_file(path)?;
        }

        let registry = builder.build();
        info!("Loaded {} templates", registry.len());
        Ok(registry)
    }

    /// Find the template for a document.
    ///
    /// A side is required for ID cards and must be absent for reports;
    /// violating that fails with [`TemplateError::InvalidLookupKey`] before
    /// the registry is consulted.
    pub fn lookup(
        &self,
        document_type: DocumentType,
        subtype: Subtype,
        side: Option<Side>,
    ) -> Result<&Template, TemplateError> {
        let key = TemplateKey::new(document_type, subtype, side)?;
        self.get(&key).ok_or(TemplateError::NotFound {
            document_type,
            subtype,
            side,
        })
    }

    /// Get a template by an already validated key.
    pub fn get(&self, key: &TemplateKey) -> Option<&Template> {
        self.templates.get(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<TemplateKey> {
        let mut keys: Vec<TemplateKey> = self.templates.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Builder for [`TemplateRegistry`].
#[derive(Debug, Default)]
pub struct TemplateRegistryBuilder {
    templates: HashMap<TemplateKey, Template>,
}

impl TemplateRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any earlier one for the same key.
    pub fn with_template(mut self, key: TemplateKey, template: Template) -> Self {
        if self.templates.insert(key, template).is_some() {
            debug!("Template {} replaced", key);
        }
        self
    }

    /// Register a template from its parts, validating the key.
    pub fn register(
        self,
        document_type: DocumentType,
        subtype: Subtype,
        side: Option<Side>,
        template: Template,
    ) -> Result<Self, TemplateError> {
        let key = TemplateKey::new(document_type, subtype, side)?;
        Ok(self.with_template(key, template))
    }

    /// Add the built-in templates.
    pub fn with_builtin(self) -> Result<Self, TemplateError> {
        self.with_json_str(BUILTIN_TEMPLATES)
    }

    /// Add templates from a JSON file.
    pub fn with_file(self, path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TemplateError::Load(format!("{}: {}", path.display(), e)))?;
        debug!("Loading templates from {}", path.display());
        self.with_json_str(&content)
    }

    /// Add templates from a JSON document.
    ///
    /// Entries replace earlier registrations with the same key, but one
    /// document may not define the same key twice.
    pub fn with_json_str(mut self, json: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile =
            serde_json::from_str(json).map_err(|e| TemplateError::Load(e.to_string()))?;

        let mut seen = HashSet::new();
        for entry in file.templates {
            let key = TemplateKey::new(entry.document_type, entry.subtype, entry.side)?;
            if !seen.insert(key) {
                return Err(TemplateError::DuplicateTemplate(key.to_string()));
            }
            self = self.with_template(key, entry.fields);
        }

        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> TemplateRegistry {
        TemplateRegistry {
            templates: self.templates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_lookup() {
        let registry = TemplateRegistry::builtin().unwrap();

        let front = registry
            .lookup(DocumentType::IdCard, Subtype::Type1, Some(Side::Front))
            .unwrap();
        assert_eq!(front.len(), 2);
        assert_eq!(
            front.region("name").unwrap().to_array(),
            [0.1, 0.2, 0.6, 0.3]
        );

        let back = registry
            .lookup(DocumentType::IdCard, Subtype::Type1, Some(Side::Back))
            .unwrap();
        assert!(back.region("address").is_some());

        let report = registry
            .lookup(DocumentType::Report, Subtype::Type1, None)
            .unwrap();
        let names: Vec<&str> = report.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["header", "party_1", "party_2"]);
    }

    #[test]
    fn test_lookup_mismatch() {
        let registry = TemplateRegistry::builtin().unwrap();

        let err = registry
            .lookup(DocumentType::IdCard, Subtype::Type1, None)
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidLookupKey(_)));

        let err = registry
            .lookup(DocumentType::Report, Subtype::Type1, Some(Side::Front))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidLookupKey(_)));
    }

    #[test]
    fn test_lookup_missing() {
        let registry = TemplateRegistry::builtin().unwrap();

        let err = registry
            .lookup(DocumentType::Report, Subtype::Type2, None)
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::NotFound {
                document_type: DocumentType::Report,
                subtype: Subtype::Type2,
                side: None,
            }
        );
        assert_eq!(err.to_string(), "no template registered for REPORT/TYPE_2");

        let err = registry
            .lookup(DocumentType::IdCard, Subtype::Type3, Some(Side::Back))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no template registered for ID_CARD/TYPE_3/back"
        );
    }

    #[test]
    fn test_file_overrides_builtin() {
        let json = r#"{
            "templates": [
                {"document_type": "REPORT", "subtype": "TYPE_1",
                 "fields": {"title": [0.0, 0.0, 1.0, 0.1]}},
                {"document_type": "REPORT", "subtype": "TYPE_2",
                 "fields": {"summary": [0.1, 0.1, 0.9, 0.9]}}
            ]
        }"#;

        let registry = TemplateRegistry::builder()
            .with_builtin()
            .unwrap()
            .with_json_str(json)
            .unwrap()
            .build();

        assert_eq!(registry.len(), 4);
        let report = registry
            .lookup(DocumentType::Report, Subtype::Type1, None)
            .unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.region("title").is_some());
    }

    #[test]
    fn test_inconsistent_entry_rejected() {
        let json = r#"{"templates": [
            {"document_type": "ID_CARD", "subtype": "TYPE_1",
             "fields": {"name": [0.1, 0.2, 0.6, 0.3]}}
        ]}"#;

        let err = TemplateRegistry::builder().with_json_str(json).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidLookupKey(_)));
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let json = r#"{"templates": [
            {"document_type": "REPORT", "subtype": "TYPE_1", "fields": {}},
            {"document_type": "REPORT", "subtype": "TYPE_1", "fields": {}}
        ]}"#;

        let err = TemplateRegistry::builder().with_json_str(json).unwrap_err();
        assert_eq!(
            err,
            TemplateError::DuplicateTemplate("REPORT/TYPE_1".to_string())
        );
    }

    #[test]
    fn test_repeated_field_in_file_rejected() {
        let json = r#"{"templates": [
            {"document_type": "REPORT", "subtype": "TYPE_1",
             "fields": {"header": [0.1, 0.05, 0.9, 0.15],
                        "header": [0.0, 0.0, 1.0, 1.0]}}
        ]}"#;

        let err = TemplateRegistry::builder().with_json_str(json).unwrap_err();
        match err {
            TemplateError::Load(msg) => {
                assert!(msg.contains("duplicate field in template: header"), "{}", msg)
            }
            other => panic!("expected load error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_box_in_file() {
        let json = r#"{"templates": [
            {"document_type": "REPORT", "subtype": "TYPE_1",
             "fields": {"header": [0.9, 0.05, 0.1, 0.15]}}
        ]}"#;

        let err = TemplateRegistry::builder().with_json_str(json).unwrap_err();
        assert!(matches!(err, TemplateError::Load(_)));
    }

    #[test]
    fn test_keys_sorted() {
        let registry = TemplateRegistry::builtin().unwrap();
        let keys: Vec<String> = registry.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["ID_CARD/TYPE_1/front", "ID_CARD/TYPE_1/back", "REPORT/TYPE_1"]
        );
    }
}
