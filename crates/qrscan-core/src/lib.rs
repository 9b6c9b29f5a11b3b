//! qrscan Core - multi-strategy barcode scanning library
//!
//! This crate provides the scanning functionality behind the qrscan C bindings:
//! image acquisition, grayscale normalization, rescaling, and the scan loop that
//! re-runs a barcode detector at several resolutions and merges the results.
//!
//! # Pipeline
//!
//! 1. [`acquire`] produces a [`RasterImage`] from a file path or raw pixel bytes
//! 2. [`luminance`] collapses it to a single-channel grayscale image
//! 3. [`Scanner`] runs the [`Detector`] once at native resolution and once per
//!    configured scale factor, keeping the first result seen for each payload
//!
//! # Examples
//!
//! ```ignore
//! use qrscan_core::{acquire, Scanner};
//!
//! let raster = acquire::load_path("ticket.png")?;
//! let outcome = Scanner::new().scan(&raster)?;
//! for hit in outcome.iter() {
//!     println!("{}: {}", hit.barcode.format, hit.barcode.text);
//! }
//! ```

pub mod acquire;
pub mod config;
pub mod detect;
pub mod luminance;
pub mod resize;
pub mod scanner;

pub use acquire::{AcquireError, Channels, RasterImage, RasterLayout};
pub use config::ScanConfig;
pub use detect::{
    BarcodeFormat, Chain, DecodedBarcode, DetectError, Detector, DetectorOptions, QrDetector,
    StandardDetector, ZxingDetector,
};
pub use resize::FilterType;
pub use scanner::{ScanError, ScanHit, ScanOutcome, ScanPass, Scanner};

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;
