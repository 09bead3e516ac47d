//! Per-field validation and normalization of OCR text.

pub mod dates;
pub mod patterns;

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::error::RuleError;
use crate::models::config::{UnknownFieldPolicy, ValidationConfig};

use dates::reformat_date;
use patterns::{DATE_DMY, DISALLOWED_CHARS, EMAIL, ID_NUMBER, PHONE};

lazy_static! {
    static ref DEFAULT_RULES: Vec<(&'static str, FieldRule)> = vec![
        ("id_number", FieldRule::new("id_number", ID_NUMBER).unwrap()),
        ("phone", FieldRule::new("phone", PHONE).unwrap()),
        ("email", FieldRule::new("email", EMAIL).unwrap()),
        ("date", FieldRule::new("date", DATE_DMY).unwrap().with_date_reformat()),
    ];
}

/// Validation rule for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Source pattern as written.
    source: String,
    /// Compiled pattern anchored to the whole value.
    anchored: Regex,
    /// Reformat `DD/MM/YYYY` to `YYYY-MM-DD` on clean.
    reformat_date: bool,
}

impl FieldRule {
    /// Compile a rule. The pattern always has to match the entire value.
    pub fn new(field: &str, pattern: &str) -> Result<Self, RuleError> {
        let anchored =
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                RuleError::InvalidPattern {
                    field: field.to_string(),
                    source,
                }
            })?;

        Ok(Self {
            source: pattern.to_string(),
            anchored,
            reformat_date: false,
        })
    }

    /// Also require a valid `DD/MM/YYYY` date and emit it as `YYYY-MM-DD`.
    pub fn with_date_reformat(mut self) -> Self {
        self.reformat_date = true;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn reformats_date(&self) -> bool {
        self.reformat_date
    }

    /// Whether `text` satisfies the rule.
    pub fn matches(&self, text: &str) -> bool {
        if !self.anchored.is_match(text) {
            return false;
        }
        !self.reformat_date || reformat_date(text).is_some()
    }
}

/// Validates and cleans raw OCR text per field name.
///
/// Read-only once built; share it behind an `Arc` across extractions.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    rules: HashMap<String, FieldRule>,
    unknown_fields: UnknownFieldPolicy,
}

impl FieldValidator {
    /// Validator with the built-in rules and a permissive unknown-field policy.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(field, rule)| (field.to_string(), rule.clone()))
                .collect(),
            unknown_fields: UnknownFieldPolicy::Accept,
        }
    }

    /// Validator with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            unknown_fields: UnknownFieldPolicy::Accept,
        }
    }

    /// Built-in rules overlaid with configured ones.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, RuleError> {
        let mut validator = Self::new().with_unknown_field_policy(config.unknown_fields);

        for (field, rule_config) in &config.rules {
            let mut rule = FieldRule::new(field, &rule_config.pattern)?;
            if rule_config.reformat_date {
                rule = rule.with_date_reformat();
            }
            validator = validator.with_rule(field.clone(), rule);
        }

        Ok(validator)
    }

    /// Add or replace the rule for a field.
    pub fn with_rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    /// Set the policy for fields that have no rule.
    pub fn with_unknown_field_policy(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.rules.get(field)
    }

    pub fn unknown_field_policy(&self) -> UnknownFieldPolicy {
        self.unknown_fields
    }

    /// Whether the raw text is acceptable for the field.
    ///
    /// Fields without a rule follow the unknown-field policy, which accepts
    /// everything by default.
    pub fn is_valid(&self, field: &str, raw: &str) -> bool {
        match self.rules.get(field) {
            Some(rule) => rule.matches(raw),
            None => {
                trace!("No rule for field '{}', policy {:?}", field, self.unknown_fields);
                self.unknown_fields == UnknownFieldPolicy::Accept
            }
        }
    }

    /// Normalize raw text for the field.
    ///
    /// Date fields that parse are emitted as `YYYY-MM-DD`; everything else
    /// goes through [`clean_text`]. Does not check validity.
    pub fn clean(&self, field: &str, raw: &str) -> String {
        if let Some(rule) = self.rules.get(field) {
            if rule.reformat_date {
                if let Some(date) = reformat_date(raw) {
                    return date;
                }
            }
        }
        clean_text(raw)
    }

    /// Clean the text if it is valid for the field, `None` otherwise.
    pub fn validate(&self, field: &str, raw: &str) -> Option<String> {
        self.is_valid(field, raw).then(|| self.clean(field, raw))
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace runs, drop characters other than word characters,
/// whitespace, `@`, `.` and `-`, and trim.
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    DISALLOWED_CHARS
        .replace_all(&collapsed, "")
        .trim()
        .to_string()
}
