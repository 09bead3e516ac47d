//! Text recognition through the `tesseract` command-line tool.

use std::path::PathBuf;
use std::process::Command;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::{OcrConfig, OcrLanguage};

use super::preprocessing::ImagePreprocessor;
use super::TextRecognizer;

/// OCR collaborator wrapping the `tesseract` binary.
///
/// Each call stages the region as a PNG in a temporary directory and reads
/// the recognized text from the tool's stdout.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: OcrLanguage,
    page_segmentation_mode: u8,
    preprocessor: ImagePreprocessor,
}

impl TesseractOcr {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    /// Create an engine from configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            language: config.language,
            page_segmentation_mode: config.page_segmentation_mode,
            preprocessor: ImagePreprocessor::new().with_binarize(config.binarize),
        }
    }

    /// Set the tesseract executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: OcrLanguage) -> Self {
        self.language = language;
        self
    }

    /// Check that the executable can be launched.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractOcr {
    fn extract_text(&self, region: &DynamicImage) -> Result<String, OcrError> {
        let prepared = self.preprocessor.prepare(region);

        let tmpdir = tempfile::Builder::new().prefix("docroi").tempdir()?;
        let input_path = tmpdir.path().join("region.png");
        prepared
            .save(&input_path)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        debug!(
            "Running {} on {}x{} region (lang={}, psm={})",
            self.binary.display(),
            prepared.width(),
            prepared.height(),
            self.language.code(),
            self.page_segmentation_mode
        );

        let output = Command::new(&self.binary)
            .arg(&input_path)
            .arg("stdout")
            .arg("-l")
            .arg(self.language.code())
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("tesseract exited with {}: {}", output.status, stderr.trim());
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        // Trailing newline and form feed are page separators, not content
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_region() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 4, image::Rgb([255, 255, 255])))
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let engine = TesseractOcr::new().with_binary("/nonexistent/docroi-tesseract");

        assert!(!engine.is_available());
        let err = engine.extract_text(&blank_region()).unwrap_err();
        assert!(matches!(err, OcrError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_stdout_from_engine() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-tesseract");
        std::fs::write(
            &script,
            "#!/bin/sh\n[ -f \"$1\" ] || exit 3\nprintf '  John   Doe \\n\\f'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = TesseractOcr::new().with_binary(&script);
        let text = engine.extract_text(&blank_region()).unwrap();
        assert_eq!(text, "John   Doe");
    }
}
