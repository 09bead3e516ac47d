//! OCR collaborator interface and the bundled tesseract adapter.

mod preprocessing;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractOcr;

use image::DynamicImage;

use crate::error::OcrError;

/// Something that turns a region image into text.
///
/// Calls are blocking; the extractor applies no timeout or retry. Any error
/// makes the extractor omit the field being read.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in an image region.
    fn extract_text(&self, region: &DynamicImage) -> Result<String, OcrError>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&DynamicImage) -> Result<String, OcrError> + Send + Sync,
{
    fn extract_text(&self, region: &DynamicImage) -> Result<String, OcrError> {
        self(region)
    }
}
