//! Grayscale rescaling for the multi-resolution scan passes.
//!
//! Uses the `image` crate's resampling filters. All functions return new
//! images without modifying the input.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Filter type for rescaling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Cubic (Catmull-Rom) interpolation, used by the scan passes.
    #[default]
    Cubic,
    /// Lanczos3 interpolation (slower, sharpest).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Cubic => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Compute the target dimensions for a uniform scale factor.
///
/// Each side is rounded to the nearest pixel and clamped to at least 1.
/// Returns `None` for non-finite or non-positive factors, or if a side would
/// not fit in `u32`.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> Option<(u32, u32)> {
    if !factor.is_finite() || factor <= 0.0 || width == 0 || height == 0 {
        return None;
    }

    let side = |v: u32| -> Option<u32> {
        let scaled = (v as f64 * factor).round().max(1.0);
        (scaled <= u32::MAX as f64).then_some(scaled as u32)
    };

    Some((side(width)?, side(height)?))
}

/// Rescale a grayscale image by a uniform factor.
///
/// A factor of exactly 1.0 returns a clone.
pub fn rescale(image: &GrayImage, factor: f64, filter: FilterType) -> Option<GrayImage> {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = scaled_dimensions(width, height, factor)?;

    if new_width == width && new_height == height {
        return Some(image.clone());
    }

    Some(image::imageops::resize(
        image,
        new_width,
        new_height,
        filter.to_image_filter(),
    ))
}
