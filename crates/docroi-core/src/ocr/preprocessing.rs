//! Image preprocessing before recognition.

use image::{DynamicImage, GrayImage, Luma};
use tracing::trace;

/// Region preprocessor applied before text recognition.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Binarize with a global Otsu threshold.
    binarize: bool,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self { binarize: true }
    }

    /// Enable or disable binarization.
    pub fn with_binarize(mut self, binarize: bool) -> Self {
        self.binarize = binarize;
        self
    }

    /// Prepare a region for recognition.
    ///
    /// Grayscale conversion always happens; binarization is optional.
    pub fn prepare(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();

        if !self.binarize {
            return DynamicImage::ImageLuma8(gray);
        }

        let threshold = otsu_threshold(&gray);
        trace!("Otsu threshold: {}", threshold);
        DynamicImage::ImageLuma8(apply_threshold(&gray, threshold))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Threshold maximizing between-class variance of the gray histogram.
pub(crate) fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = 0f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }

        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;

        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;
        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

/// Pixels above `threshold` become white, the rest black.
fn apply_threshold(image: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let value = image.get_pixel(x, y)[0];
        Luma([if value > threshold { 255 } else { 0 }])
    })
}
