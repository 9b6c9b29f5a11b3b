//! Grayscale normalization using ITU-R BT.601 coefficients.
//!
//! Every scan pass works on a single-channel image. This module collapses RGB
//! and RGBA rasters to luminance once per scan; the alpha channel is ignored.

use image::GrayImage;

use crate::acquire::{AcquireError, Channels, RasterImage};

/// ITU-R BT.601 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.114;

/// Calculate luminance from u8 RGB values (0 to 255).
#[inline]
pub fn calculate_luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    let lum = LUMINANCE_R * r as f32 + LUMINANCE_G * g as f32 + LUMINANCE_B * b as f32;
    lum.clamp(0.0, 255.0).round() as u8
}

/// Convert a raster to a single-channel grayscale image.
///
/// Grayscale input is passed through (copied into a `GrayImage`); color input
/// is converted pixel by pixel. Fails if `pixels` does not hold exactly
/// `width * height * channels` bytes.
pub fn to_grayscale(raster: &RasterImage) -> Result<GrayImage, AcquireError> {
    let expected = (raster.width as usize)
        .checked_mul(raster.height as usize)
        .and_then(|n| n.checked_mul(raster.channels.count()))
        .ok_or(AcquireError::InvalidDimensions {
            width: raster.width.into(),
            height: raster.height.into(),
        })?;
    if raster.pixels.len() != expected {
        return Err(AcquireError::BufferSize {
            expected,
            actual: raster.pixels.len(),
        });
    }

    let pixels = match raster.channels {
        Channels::Gray => raster.pixels.clone(),
        Channels::Rgb | Channels::Rgba => raster
            .pixels
            .chunks_exact(raster.channels.count())
            .map(|px| calculate_luminance_u8(px[0], px[1], px[2]))
            .collect(),
    };

    GrayImage::from_raw(raster.width, raster.height, pixels).ok_or(AcquireError::BufferSize {
        expected,
        actual: raster.pixels.len(),
    })
}
