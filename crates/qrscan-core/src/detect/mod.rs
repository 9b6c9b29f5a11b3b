//! Barcode detection seam.
//!
//! The scanner never decodes symbols itself. It hands a grayscale image and a
//! set of [`DetectorOptions`] to a [`Detector`] and merges whatever comes back.
//! The production detector is [`StandardDetector`]: the ZXing port (`rxing`)
//! for every supported symbology, followed by `rqrr` for QR codes.

mod chain;
mod qr;
mod search;
mod zxing;

use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chain::{Chain, StandardDetector};
pub use qr::QrDetector;
pub use search::DEFAULT_DOWNSCALE_THRESHOLD;
pub use zxing::ZxingDetector;

/// Default cap on symbols reported by a single detector call.
pub const DEFAULT_MAX_SYMBOLS: usize = 20;

/// Error types for detector backends.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The image has a zero dimension.
    #[error("Cannot detect in an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    /// The backend panicked while processing the image.
    #[error("Detector panicked: {0}")]
    Panicked(String),

    /// The backend reported a failure of its own.
    #[error("Detector failure: {0}")]
    Backend(String),
}

/// Barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeFormat {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataBar,
    DataBarExpanded,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    MaxiCode,
    Pdf417,
    QrCode,
    MicroQrCode,
    UpcA,
    UpcE,
}

impl BarcodeFormat {
    /// Every symbology a backend can report.
    pub const ALL: [BarcodeFormat; 17] = [
        BarcodeFormat::Aztec,
        BarcodeFormat::Codabar,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::DataBar,
        BarcodeFormat::DataBarExpanded,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::Itf,
        BarcodeFormat::MaxiCode,
        BarcodeFormat::Pdf417,
        BarcodeFormat::QrCode,
        BarcodeFormat::MicroQrCode,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
    ];

    /// Stable label reported across the C boundary.
    pub fn label(self) -> &'static str {
        match self {
            BarcodeFormat::Aztec => "Aztec",
            BarcodeFormat::Codabar => "Codabar",
            BarcodeFormat::Code39 => "Code39",
            BarcodeFormat::Code93 => "Code93",
            BarcodeFormat::Code128 => "Code128",
            BarcodeFormat::DataBar => "DataBar",
            BarcodeFormat::DataBarExpanded => "DataBarExpanded",
            BarcodeFormat::DataMatrix => "DataMatrix",
            BarcodeFormat::Ean8 => "EAN-8",
            BarcodeFormat::Ean13 => "EAN-13",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::MaxiCode => "MaxiCode",
            BarcodeFormat::Pdf417 => "PDF417",
            BarcodeFormat::QrCode => "QRCode",
            BarcodeFormat::MicroQrCode => "MicroQRCode",
            BarcodeFormat::UpcA => "UPC-A",
            BarcodeFormat::UpcE => "UPC-E",
        }
    }

    /// Whether this is a linear (1D) symbology.
    pub fn is_linear(self) -> bool {
        matches!(
            self,
            BarcodeFormat::Codabar
                | BarcodeFormat::Code39
                | BarcodeFormat::Code93
                | BarcodeFormat::Code128
                | BarcodeFormat::DataBar
                | BarcodeFormat::DataBarExpanded
                | BarcodeFormat::Ean8
                | BarcodeFormat::Ean13
                | BarcodeFormat::Itf
                | BarcodeFormat::UpcA
                | BarcodeFormat::UpcE
        )
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded payload and the symbology it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBarcode {
    /// Decoded text content.
    pub text: String,
    /// Symbology the payload was decoded from.
    pub format: BarcodeFormat,
}

impl DecodedBarcode {
    pub fn new(text: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

/// Search effort and filtering for one detector call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Symbologies to report. Empty means any.
    pub formats: Vec<BarcodeFormat>,
    /// Run every enabled search variant instead of stopping at the first hit.
    pub try_harder: bool,
    /// Also search the image rotated by 90 degrees.
    pub try_rotate: bool,
    /// Also search downscaled copies of large images.
    pub try_downscale: bool,
    /// Also search the inverted image (light modules on dark background).
    pub try_invert: bool,
    /// Maximum number of symbols to report.
    pub max_symbols: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            try_harder: true,
            try_rotate: true,
            try_downscale: true,
            try_invert: true,
            max_symbols: DEFAULT_MAX_SYMBOLS,
        }
    }
}

impl DetectorOptions {
    /// Check whether results of `format` should be reported.
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        self.formats.is_empty() || self.formats.contains(&format)
    }
}

/// A barcode detection backend.
///
/// Implementations must not fail on a well-formed, non-empty image that simply
/// contains no symbols; that is an empty `Ok`.
pub trait Detector {
    fn detect(
        &self,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DecodedBarcode>, DetectError>;
}

impl<D: Detector + ?Sized> Detector for &D {
    fn detect(
        &self,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DecodedBarcode>, DetectError> {
        (**self).detect(image, options)
    }
}
