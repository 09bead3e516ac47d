//! Core library for template-driven document field extraction.
//!
//! This crate provides:
//! - A read-only registry of field templates per document type, subtype and side
//! - Cropping of normalized regions of interest out of document images
//! - Per-field validation and normalization of OCR text
//! - An extractor tying those together around a pluggable OCR collaborator

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod region;
pub mod template;
pub mod validate;

pub use error::{DocroiError, OcrError, RegionError, Result, RuleError, TemplateError};
pub use extract::{LabelRule, LabeledFieldParser, StructuredExtractor};
pub use models::config::{DocroiConfig, OcrLanguage, UnknownFieldPolicy};
pub use models::document::{DocumentType, NormalizedBox, Side, Subtype, TemplateKey};
pub use models::record::ExtractedRecord;
pub use ocr::{ImagePreprocessor, TextRecognizer};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractOcr;
pub use region::{extract_region, PixelRect};
pub use template::{Template, TemplateRegistry, TemplateRegistryBuilder};
pub use validate::{clean_text, FieldRule, FieldValidator};

use std::sync::Arc;

/// Build the shared registry and validator described by a configuration.
pub fn load_components(config: &DocroiConfig) -> Result<(Arc<TemplateRegistry>, Arc<FieldValidator>)> {
    let registry = TemplateRegistry::from_config(&config.templates)?;
    let validator = FieldValidator::from_config(&config.validation)?;
    Ok((Arc::new(registry), Arc::new(validator)))
}

/// Tesseract recognizer for `config`, failing if the binary cannot be run.
#[cfg(feature = "tesseract")]
pub fn create_recognizer(config: &DocroiConfig) -> Result<TesseractOcr> {
    let recognizer = TesseractOcr::from_config(&config.ocr);
    if !recognizer.is_available() {
        return Err(DocroiError::Config(format!(
            "tesseract not found at '{}'; install tesseract or set ocr.binary",
            config.ocr.binary.display()
        )));
    }
    Ok(recognizer)
}
