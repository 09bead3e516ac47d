//! Document identification types and normalized coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::TemplateError;

/// Kind of document being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Identity card (two-sided).
    IdCard,
    /// Single-sided report form.
    Report,
}

impl DocumentType {
    /// Whether lookups for this document type require a [`Side`].
    pub fn is_sided(self) -> bool {
        matches!(self, DocumentType::IdCard)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::IdCard => "ID_CARD",
            DocumentType::Report => "REPORT",
        }
    }
}

/// Layout variant within a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subtype {
    #[serde(rename = "TYPE_1")]
    Type1,
    #[serde(rename = "TYPE_2")]
    Type2,
    #[serde(rename = "TYPE_3")]
    Type3,
}

impl Subtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::Type1 => "TYPE_1",
            Subtype::Type2 => "TYPE_2",
            Subtype::Type3 => "TYPE_3",
        }
    }
}

/// Card side; only meaningful for [`DocumentType::IdCard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a document tag from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseTagError {
    kind: &'static str,
    value: String,
}

impl ParseTagError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Normalize user input: case-insensitive, `-` and `_` interchangeable.
fn normalize_tag(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace('-', "_")
}

impl FromStr for DocumentType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "ID_CARD" | "IDCARD" => Ok(DocumentType::IdCard),
            "REPORT" => Ok(DocumentType::Report),
            _ => Err(ParseTagError::new("document type", s)),
        }
    }
}

impl FromStr for Subtype {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "TYPE_1" | "1" => Ok(Subtype::Type1),
            "TYPE_2" | "2" => Ok(Subtype::Type2),
            "TYPE_3" | "3" => Ok(Subtype::Type3),
            _ => Err(ParseTagError::new("subtype", s)),
        }
    }
}

impl FromStr for Side {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "FRONT" => Ok(Side::Front),
            "BACK" => Ok(Side::Back),
            _ => Err(ParseTagError::new("side", s)),
        }
    }
}

/// Registry key: document type, subtype and (for ID cards) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateKey {
    pub document_type: DocumentType,
    pub subtype: Subtype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl TemplateKey {
    /// Build a key, rejecting a side that does not fit the document type.
    pub fn new(
        document_type: DocumentType,
        subtype: Subtype,
        side: Option<Side>,
    ) -> Result<Self, TemplateError> {
        match (document_type.is_sided(), side) {
            (true, None) => Err(TemplateError::InvalidLookupKey(format!(
                "{} requires a side (front or back)",
                document_type
            ))),
            (false, Some(side)) => Err(TemplateError::InvalidLookupKey(format!(
                "{} does not take a side, got {}",
                document_type, side
            ))),
            _ => Ok(Self {
                document_type,
                subtype,
                side,
            }),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document_type, self.subtype)?;
        if let Some(side) = self.side {
            write!(f, "/{}", side)?;
        }
        Ok(())
    }
}

/// Rectangle expressed as fractions of image width and height.
///
/// Origin is the top-left corner and `y` grows downward, matching raster
/// convention. Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormalizedBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl NormalizedBox {
    /// Create a box, enforcing `0 <= x1 < x2 <= 1` and `0 <= y1 < y2 <= 1`.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, TemplateError> {
        let invalid = |reason| TemplateError::InvalidBox {
            x1,
            y1,
            x2,
            y2,
            reason,
        };

        if [x1, y1, x2, y2].iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(invalid("coordinates must lie in [0, 1]"));
        }
        if x1 >= x2 {
            return Err(invalid("x1 must be less than x2"));
        }
        if y1 >= y2 {
            return Err(invalid("y1 must be less than y2"));
        }

        Ok(Self { x1, y1, x2, y2 })
    }

    /// Box covering the whole image.
    pub fn full() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_unchecked(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn x2(&self) -> f64 {
        self.x2
    }

    pub fn y2(&self) -> f64 {
        self.y2
    }

    /// Coordinates as `[x1, y1, x2, y2]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl TryFrom<[f64; 4]> for NormalizedBox {
    type Error = TemplateError;

    fn try_from(value: [f64; 4]) -> Result<Self, Self::Error> {
        let [x1, y1, x2, y2] = value;
        NormalizedBox::new(x1, y1, x2, y2)
    }
}

impl From<NormalizedBox> for [f64; 4] {
    fn from(value: NormalizedBox) -> Self {
        value.to_array()
    }
}
