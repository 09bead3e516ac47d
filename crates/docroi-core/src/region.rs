//! Cropping regions of interest out of document images.

use image::{DynamicImage, GenericImageView};

use crate::error::RegionError;
use crate::models::document::NormalizedBox;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Map a normalized box onto an image of `width` x `height` pixels.
    ///
    /// Each corner is rounded to the nearest pixel and clamped to the image
    /// bounds. A rectangle that collapses to zero width or height fails with
    /// [`RegionError::EmptyRegion`].
    pub fn from_normalized(
        region: &NormalizedBox,
        width: u32,
        height: u32,
    ) -> Result<Self, RegionError> {
        let x1 = scale(region.x1(), width);
        let y1 = scale(region.y1(), height);
        let x2 = scale(region.x2(), width);
        let y2 = scale(region.y2(), height);

        if x2 <= x1 || y2 <= y1 {
            return Err(RegionError::EmptyRegion { width, height });
        }

        Ok(Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }
}

fn scale(fraction: f64, extent: u32) -> u32 {
    (fraction * extent as f64).round().clamp(0.0, extent as f64) as u32
}

/// Crop the sub-image covered by `region`.
///
/// Pure crop: no resampling or color conversion happens here.
pub fn extract_region(
    image: &DynamicImage,
    region: &NormalizedBox,
) -> Result<DynamicImage, RegionError> {
    let (width, height) = image.dimensions();
    let rect = PixelRect::from_normalized(region, width, height)?;
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}
