//! `Label: value` extraction from full-page OCR text.

use regex::Regex;
use tracing::debug;

use crate::models::record::ExtractedRecord;
use crate::validate::patterns::{
    LABEL_DATE_OF_BIRTH, LABEL_EMAIL, LABEL_EXPIRY_DATE, LABEL_ID_NUMBER, LABEL_ISSUE_DATE,
    LABEL_LICENSE_NUMBER, LABEL_NAME, LABEL_NATIONALITY, LABEL_PHONE,
};
use crate::validate::FieldValidator;

/// One labeled field: the regex whose first group is the value, and the
/// validator rule it is checked against.
#[derive(Debug, Clone)]
pub struct LabelRule {
    field: String,
    pattern: Regex,
    validate_as: String,
}

impl LabelRule {
    /// Rule validated under its own field name.
    pub fn new(field: impl Into<String>, pattern: Regex) -> Self {
        let field = field.into();
        Self {
            validate_as: field.clone(),
            field,
            pattern,
        }
    }

    /// Validate the value with another field's rule (e.g. `date`).
    pub fn validated_as(mut self, rule_field: impl Into<String>) -> Self {
        self.validate_as = rule_field.into();
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Pulls labeled values out of free text.
#[derive(Debug, Clone)]
pub struct LabeledFieldParser {
    rules: Vec<LabelRule>,
}

impl LabeledFieldParser {
    /// Parser for the labels printed on common ID documents.
    pub fn new() -> Self {
        Self {
            rules: vec![
                LabelRule::new("name", LABEL_NAME.clone()),
                LabelRule::new("date_of_birth", LABEL_DATE_OF_BIRTH.clone()).validated_as("date"),
                LabelRule::new("nationality", LABEL_NATIONALITY.clone()),
                LabelRule::new("issue_date", LABEL_ISSUE_DATE.clone()).validated_as("date"),
                LabelRule::new("expiry_date", LABEL_EXPIRY_DATE.clone()).validated_as("date"),
                LabelRule::new("id_number", LABEL_ID_NUMBER.clone()),
                LabelRule::new("license_number", LABEL_LICENSE_NUMBER.clone()),
                LabelRule::new("phone", LABEL_PHONE.clone()),
                LabelRule::new("email", LABEL_EMAIL.clone()),
            ],
        }
    }

    /// Parser with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule.
    pub fn with_rule(mut self, rule: LabelRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Extract every labeled field found in `text`.
    ///
    /// The first match of each label wins; values that fail validation are
    /// left out.
    pub fn parse(&self, text: &str, validator: &FieldValidator) -> ExtractedRecord {
        let mut record = ExtractedRecord::new();

        for rule in &self.rules {
            let Some(value) = rule
                .pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
            else {
                continue;
            };

            match validator.validate(&rule.validate_as, value) {
                Some(cleaned) => {
                    record.insert(rule.field.as_str(), cleaned);
                }
                None => debug!("Label '{}' rejected: {:?}", rule.field, value),
            }
        }

        record
    }
}

impl Default for LabeledFieldParser {
    fn default() -> Self {
        Self::new()
    }
}
