//! QR code detection backed by `rqrr`.
//!
//! `rqrr` finds and decodes QR Model 2 grids only. In the default chain it
//! runs after the ZXing backend and contributes codes that backend missed.

use image::GrayImage;
use rqrr::PreparedImage;

use super::search::{self, DEFAULT_DOWNSCALE_THRESHOLD};
use super::{BarcodeFormat, DecodedBarcode, DetectError, Detector, DetectorOptions};

/// QR code detector.
#[derive(Debug, Clone)]
pub struct QrDetector {
    downscale_threshold: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    pub fn new() -> Self {
        Self {
            downscale_threshold: DEFAULT_DOWNSCALE_THRESHOLD,
        }
    }

    /// Use a custom shorter-side threshold for downscale search.
    pub fn with_downscale_threshold(threshold: u32) -> Self {
        Self {
            downscale_threshold: threshold.max(1),
        }
    }
}

/// Decode every QR grid rqrr can find in `image`.
fn decode_grids(image: &GrayImage) -> Vec<DecodedBarcode> {
    let (w, h) = image.dimensions();
    let mut prepared = PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        image.get_pixel(x as u32, y as u32).0[0]
    });

    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(DecodedBarcode::new(content, BarcodeFormat::QrCode)),
            Err(err) => {
                log::trace!("qr grid found but not decodable: {err:?}");
                None
            }
        })
        .collect()
}

impl Detector for QrDetector {
    fn detect(
        &self,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DecodedBarcode>, DetectError> {
        if !options.accepts(BarcodeFormat::QrCode) {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                return Err(DetectError::EmptyImage { width, height });
            }
            return Ok(Vec::new());
        }

        search::search(image, options, self.downscale_threshold, |variant| {
            Ok(decode_grids(variant))
        })
    }
}
