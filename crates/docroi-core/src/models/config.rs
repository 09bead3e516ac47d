//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration for docroi.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocroiConfig {
    /// OCR collaborator configuration.
    pub ocr: OcrConfig,

    /// Field validation configuration.
    pub validation: ValidationConfig,

    /// Template source configuration.
    pub templates: TemplateConfig,
}

/// Recognition language passed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrLanguage {
    #[default]
    English,
    Arabic,
}

impl OcrLanguage {
    /// Tesseract language code.
    pub fn code(self) -> &'static str {
        match self {
            OcrLanguage::English => "eng",
            OcrLanguage::Arabic => "ara",
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable.
    pub binary: PathBuf,

    /// Recognition language.
    pub language: OcrLanguage,

    /// Tesseract page segmentation mode (`--psm`).
    pub page_segmentation_mode: u8,

    /// Binarize regions (grayscale + Otsu threshold) before recognition.
    pub binarize: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: OcrLanguage::English,
            page_segmentation_mode: 6, // Uniform block of text
            binarize: true,
        }
    }
}

/// What to do with fields that have no validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Keep whatever the OCR produced.
    #[default]
    Accept,
    /// Drop the field.
    Reject,
}

/// A user-supplied validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRuleConfig {
    /// Regular expression the whole value must match.
    pub pattern: String,

    /// Reformat `DD/MM/YYYY` values to `YYYY-MM-DD`.
    #[serde(default)]
    pub reformat_date: bool,
}

/// Field validation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Policy for fields without a rule.
    pub unknown_fields: UnknownFieldPolicy,

    /// Extra rules, merged over the built-in ones.
    pub rules: BTreeMap<String, FieldRuleConfig>,
}

/// Template source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// JSON template file to load.
    pub path: Option<PathBuf>,

    /// Start from the built-in templates.
    pub include_builtin: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: None,
            include_builtin: true,
        }
    }
}

impl DocroiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DocroiConfig = serde_json::from_str(
            r#"{"ocr": {"language": "arabic"}, "validation": {"unknown_fields": "reject"}}"#,
        )
        .unwrap();

        assert_eq!(config.ocr.language.code(), "ara");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.validation.unknown_fields, UnknownFieldPolicy::Reject);
        assert!(config.templates.include_builtin);
    }

    #[test]
    fn test_rule_config() {
        let config: ValidationConfig = serde_json::from_str(
            r#"{"rules": {"expiry": {"pattern": "\\d{2}/\\d{2}/\\d{4}", "reformat_date": true}}}"#,
        )
        .unwrap();

        let rule = &config.rules["expiry"];
        assert!(rule.reformat_date);
        assert_eq!(rule.pattern, r"\d{2}/\d{2}/\d{4}");
    }
}
