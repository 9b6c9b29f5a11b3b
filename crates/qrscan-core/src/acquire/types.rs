//! Core types for image acquisition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image acquisition.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file format is not recognized, unsupported, or the data is corrupt.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Raw pixel input declared a channel count other than 1, 3 or 4.
    #[error("Unsupported channel count: {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(i32),

    /// Width or height is zero, negative, or too large to address.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Pixel buffer length does not match the declared layout.
    #[error("Pixel buffer too small: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}

impl From<image::ImageError> for AcquireError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => AcquireError::Io(io),
            other => AcquireError::Decode(other.to_string()),
        }
    }
}

/// Number of interleaved 8-bit channels per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channels {
    /// Single luminance channel.
    Gray = 1,
    /// Three color channels, red first.
    Rgb = 3,
    /// Three color channels plus alpha.
    Rgba = 4,
}

impl Channels {
    /// Bytes per pixel.
    #[inline]
    pub fn count(self) -> usize {
        self as usize
    }
}

impl TryFrom<i32> for Channels {
    type Error = AcquireError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Channels::Gray),
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            other => Err(AcquireError::UnsupportedChannels(other)),
        }
    }
}

/// A validated description of a raw pixel buffer.
///
/// Constructing one checks the declared dimensions and channel count before any
/// pixel memory is touched, so callers holding a raw pointer can size their
/// slice from [`RasterLayout::byte_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
}

impl RasterLayout {
    /// Validate C-style layout parameters.
    ///
    /// Channel count is checked first, then dimensions; the total byte length
    /// must fit in `usize`.
    pub fn validate(width: i32, height: i32, channels: i32) -> Result<Self, AcquireError> {
        let channels = Channels::try_from(channels)?;
        let invalid = || AcquireError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        };

        let w = u32::try_from(width).ok().filter(|w| *w > 0).ok_or_else(invalid)?;
        let h = u32::try_from(height).ok().filter(|h| *h > 0).ok_or_else(invalid)?;

        (w as usize)
            .checked_mul(h as usize)
            .and_then(|n| n.checked_mul(channels.count()))
            .ok_or_else(invalid)?;

        Ok(Self {
            width: w,
            height: h,
            channels,
        })
    }

    /// Total number of bytes described by this layout.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels.count()
    }
}

/// An owned, interleaved 8-bit raster.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channel layout of `pixels`.
    pub channels: Channels,
    /// Pixel data in row-major order, `width * height * channels` bytes.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a new RasterImage from its parts.
    pub fn new(width: u32, height: u32, channels: Channels, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * channels.count(),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Wrap a grayscale image buffer without copying.
    pub fn from_gray_image(img: image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, Channels::Gray, img.into_raw())
    }

    /// Convert a decoded image, keeping grayscale sources single-channel.
    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        let color = img.color();
        if !color.has_color() {
            return Self::from_gray_image(img.into_luma8());
        }

        let (width, height) = (img.width(), img.height());
        if color.has_alpha() {
            Self::new(width, height, Channels::Rgba, img.into_rgba8().into_raw())
        } else {
            Self::new(width, height, Channels::Rgb, img.into_rgb8().into_raw())
        }
    }
}
