//! Running two detector backends as one.

use std::collections::HashSet;

use image::GrayImage;

use super::{DecodedBarcode, DetectError, Detector, DetectorOptions, QrDetector, ZxingDetector};

/// The production detector: ZXing for every symbology, then rqrr for QR.
pub type StandardDetector = Chain<ZxingDetector, QrDetector>;

/// Runs `first`, then `second`, and merges their results.
///
/// A text reported by both keeps the entry (and symbology) from `first`. The
/// merged list is capped at `max_symbols`. Without `try_harder`, `second` only
/// runs when `first` found nothing. A failure in either backend fails the call.
#[derive(Debug, Clone, Default)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Detector, B: Detector> Detector for Chain<A, B> {
    fn detect(
        &self,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DecodedBarcode>, DetectError> {
        let mut found = self.first.detect(image, options)?;
        found.truncate(options.max_symbols);

        if found.len() >= options.max_symbols || (!options.try_harder && !found.is_empty()) {
            return Ok(found);
        }

        let mut seen: HashSet<String> = found.iter().map(|b| b.text.clone()).collect();
        for barcode in self.second.detect(image, options)? {
            if found.len() >= options.max_symbols {
                break;
            }
            if seen.insert(barcode.text.clone()) {
                found.push(barcode);
            }
        }

        Ok(found)
    }
}
