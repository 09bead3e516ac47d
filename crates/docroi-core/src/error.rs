//! Error types for the docroi-core library.

use thiserror::Error;

use crate::models::document::{DocumentType, Side, Subtype};

/// Main error type for the docroi library.
#[derive(Error, Debug)]
pub enum DocroiError {
    /// Template registry error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Region cropping error.
    #[error("region error: {0}")]
    Region(#[from] RegionError),

    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field rule construction error.
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to template registration and lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// No template registered for the requested key.
    #[error("no template registered for {document_type}/{subtype}{}", side_suffix(.side))]
    NotFound {
        document_type: DocumentType,
        subtype: Subtype,
        side: Option<Side>,
    },

    /// Side supplied or omitted inconsistently with the document type.
    #[error("invalid lookup key: {0}")]
    InvalidLookupKey(String),

    /// Normalized box outside [0, 1] or with non-positive extent.
    #[error("invalid box ({x1}, {y1}, {x2}, {y2}): {reason}")]
    InvalidBox {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        reason: &'static str,
    },

    /// The same field name was registered twice in one template.
    #[error("duplicate field in template: {0}")]
    DuplicateField(String),

    /// The same key was registered twice in one source.
    #[error("duplicate template for {0}")]
    DuplicateTemplate(String),

    /// Template source could not be read or parsed.
    #[error("failed to load templates: {0}")]
    Load(String),
}

fn side_suffix(side: &Option<Side>) -> String {
    side.map(|s| format!("/{}", s)).unwrap_or_default()
}

/// Errors related to cropping a region out of an image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// The clamped pixel box has zero width or height.
    #[error("region is empty on a {width}x{height} image")]
    EmptyRegion { width: u32, height: u32 },
}

/// Errors raised by an OCR collaborator.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine ran but reported a failure.
    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// The region image could not be handed to the engine.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Spawning the engine or staging its input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while compiling field rules.
#[derive(Error, Debug)]
pub enum RuleError {
    /// The pattern for a field is not a valid regular expression.
    #[error("invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for the docroi library.
pub type Result<T> = std::result::Result<T, DocroiError>;
