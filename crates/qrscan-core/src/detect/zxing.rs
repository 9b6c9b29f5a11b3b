//! Multi-symbology detection backed by `rxing`, the Rust port of ZXing.
//!
//! Reads QR, Micro QR, DataMatrix, Aztec, PDF417, MaxiCode and the common
//! linear symbologies. Several symbols per image are found with ZXing's
//! generic multi-reader, which re-runs the single reader on the regions
//! around each hit.

use std::collections::HashSet;

use image::GrayImage;
use rxing::common::HybridBinarizer;
use rxing::multi::{GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{BinaryBitmap, DecodeHints, Luma8LuminanceSource, MultiFormatReader};

use super::search::{self, DEFAULT_DOWNSCALE_THRESHOLD};
use super::{BarcodeFormat, DecodedBarcode, DetectError, Detector, DetectorOptions};

/// ZXing-based detector for every supported symbology.
#[derive(Debug, Clone)]
pub struct ZxingDetector {
    downscale_threshold: u32,
}

impl Default for ZxingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ZxingDetector {
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

fn from_rxing(format: &rxing::BarcodeFormat) -> Option<BarcodeFormat> {
    use rxing::BarcodeFormat as Z;

    let format = match format {
        Z::AZTEC => BarcodeFormat::Aztec,
        Z::CODABAR => BarcodeFormat::Codabar,
        Z::CODE_39 => BarcodeFormat::Code39,
        Z::CODE_93 => BarcodeFormat::Code93,
        Z::CODE_128 => BarcodeFormat::Code128,
        Z::RSS_14 => BarcodeFormat::DataBar,
        Z::RSS_EXPANDED => BarcodeFormat::DataBarExpanded,
        Z::DATA_MATRIX => BarcodeFormat::DataMatrix,
        Z::EAN_8 => BarcodeFormat::Ean8,
        Z::EAN_13 => BarcodeFormat::Ean13,
        Z::ITF => BarcodeFormat::Itf,
        Z::MAXICODE => BarcodeFormat::MaxiCode,
        Z::PDF_417 => BarcodeFormat::Pdf417,
        Z::QR_CODE => BarcodeFormat::QrCode,
        Z::MICRO_QR_CODE => BarcodeFormat::MicroQrCode,
        Z::UPC_A => BarcodeFormat::UpcA,
        Z::UPC_E => BarcodeFormat::UpcE,
        // Add-on supplements and newer symbologies are not reported
        _ => return None,
    };
    Some(format)
}

fn to_rxing(format: BarcodeFormat) -> rxing::BarcodeFormat {
    use rxing::BarcodeFormat as Z;

    match format {
        BarcodeFormat::Aztec => Z::AZTEC,
        BarcodeFormat::Codabar => Z::CODABAR,
        BarcodeFormat::Code39 => Z::CODE_39,
        BarcodeFormat::Code93 => Z::CODE_93,
        BarcodeFormat::Code128 => Z::CODE_128,
        BarcodeFormat::DataBar => Z::RSS_14,
        BarcodeFormat::DataBarExpanded => Z::RSS_EXPANDED,
        BarcodeFormat::DataMatrix => Z::DATA_MATRIX,
        BarcodeFormat::Ean8 => Z::EAN_8,
        BarcodeFormat::Ean13 => Z::EAN_13,
        BarcodeFormat::Itf => Z::ITF,
        BarcodeFormat::MaxiCode => Z::MAXICODE,
        BarcodeFormat::Pdf417 => Z::PDF_417,
        BarcodeFormat::QrCode => Z::QR_CODE,
        BarcodeFormat::MicroQrCode => Z::MICRO_QR_CODE,
        BarcodeFormat::UpcA => Z::UPC_A,
        BarcodeFormat::UpcE => Z::UPC_E,
    }
}

/// Translate detector options into ZXing decode hints.
fn hints_for(options: &DetectorOptions) -> DecodeHints {
    let formats: HashSet<rxing::BarcodeFormat> = if options.formats.is_empty() {
        BarcodeFormat::ALL.iter().copied().map(to_rxing).collect()
    } else {
        options.formats.iter().copied().map(to_rxing).collect()
    };

    let mut hints = DecodeHints::default();
    hints.TryHarder = Some(options.try_harder);
    hints.PossibleFormats = Some(formats);
    hints
}

/// Decode every symbol ZXing can find in `image`.
fn decode_symbols(image: &GrayImage, hints: &DecodeHints) -> Vec<DecodedBarcode> {
    let (w, h) = image.dimensions();
    let source = Luma8LuminanceSource::new(image.as_raw().clone(), w, h);
    let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
    let mut reader = GenericMultipleBarcodeReader::new(MultiFormatReader::default());

    match reader.decode_multiple_with_hints(&mut bitmap, &hints.clone().into()) {
        Ok(results) => results
            .iter()
            .filter_map(|result| {
                let format = from_rxing(result.getBarcodeFormat())?;
                Some(DecodedBarcode::new(result.getText(), format))
            })
            .collect(),
        Err(err) => {
            // NotFound is the normal outcome for a variant without symbols
            log::trace!("zxing: {err:?}");
            Vec::new()
        }
    }
}

impl Detector for ZxingDetector {
    fn detect(
        &self,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DecodedBarcode>, DetectError> {
        let hints = hints_for(options);

        // 2D readers are rotation invariant; only linear codes need the rotated copy
        let wants_linear =
            options.formats.is_empty() || options.formats.iter().any(|f| f.is_linear());
        let options = DetectorOptions {
            try_rotate: options.try_rotate && wants_linear,
            ..options.clone()
        };

        search::search(image, &options, self.downscale_threshold, |variant| {
            Ok(decode_symbols(variant, &hints))
        })
    }
}
