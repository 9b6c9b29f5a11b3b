//! Multi-strategy scan loop.
//!
//! A single detector run at one resolution misses codes that are too small,
//! too large, or at awkward angles for the detector's search budget. The
//! scanner converts the input to grayscale once, then runs the detector at
//! native resolution and at every configured scale factor, in order. Results
//! are merged by payload text: the first pass to report a text wins, and later
//! reports of the same text are dropped even if their symbology differs.
//!
//! Any detector failure aborts the whole scan. Passes already merged are
//! discarded with it.

use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use image::GrayImage;
use thiserror::Error;

use crate::acquire::{AcquireError, RasterImage};
use crate::config::ScanConfig;
use crate::detect::{DecodedBarcode, DetectError, Detector, DetectorOptions, StandardDetector};
use crate::{luminance, resize};

/// Error types for a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The detector failed during a pass.
    #[error("Detection failed on {pass} pass: {source}")]
    Detect {
        pass: ScanPass,
        #[source]
        source: DetectError,
    },

    /// A configured scale factor is not a positive finite number.
    #[error("Invalid scale factor: {0}")]
    InvalidScale(f64),

    /// The raster's pixel buffer does not match its declared layout.
    #[error(transparent)]
    Raster(#[from] AcquireError),
}

/// One detector run in the scan schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanPass {
    /// The grayscale image at its own resolution.
    Native,
    /// The grayscale image rescaled by the given factor.
    Scaled(f64),
}

impl fmt::Display for ScanPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPass::Native => write!(f, "native"),
            ScanPass::Scaled(factor) => write!(f, "{factor}x"),
        }
    }
}

/// A merged result and the pass that first reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHit {
    pub barcode: DecodedBarcode,
    pub pass: ScanPass,
}

/// Unique results of a scan in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    hits: Vec<ScanHit>,
    passes_run: usize,
    timed_out: bool,
}

impl ScanOutcome {
    /// Number of unique payloads found.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScanHit> {
        self.hits.iter()
    }

    /// Number of detector passes that ran.
    pub fn passes_run(&self) -> usize {
        self.passes_run
    }

    /// Whether the deadline cut the pass schedule short.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Drop pass attribution and keep the barcodes, in order.
    pub fn into_barcodes(self) -> Vec<DecodedBarcode> {
        self.hits.into_iter().map(|hit| hit.barcode).collect()
    }

    /// Append every barcode whose text has not been seen yet.
    fn merge(&mut self, seen: &mut HashSet<String>, pass: ScanPass, found: Vec<DecodedBarcode>) {
        for barcode in found {
            if seen.contains(&barcode.text) {
                continue;
            }
            seen.insert(barcode.text.clone());
            self.hits.push(ScanHit { barcode, pass });
        }
    }
}

impl<'a> IntoIterator for &'a ScanOutcome {
    type Item = &'a ScanHit;
    type IntoIter = std::slice::Iter<'a, ScanHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Multi-resolution barcode scanner.
///
/// # Example
/// ```ignore
/// use qrscan_core::{ScanConfig, Scanner};
///
/// let scanner = Scanner::with_config(ScanConfig::new().with_max_symbols(5));
/// let outcome = scanner.scan(&raster)?;
/// println!("{} code(s) in {} passes", outcome.len(), outcome.passes_run());
/// ```
#[derive(Debug, Clone)]
pub struct Scanner<D = StandardDetector> {
    detector: D,
    config: ScanConfig,
}

impl Scanner<StandardDetector> {
    /// Create a scanner with the standard backends and the default policy.
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// Create a scanner with the standard backends and a custom policy.
    pub fn with_config(config: ScanConfig) -> Self {
        Self {
            detector: StandardDetector::default(),
            config,
        }
    }
}

impl Default for Scanner<StandardDetector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Detector> Scanner<D> {
    /// Create a scanner over any detector backend.
    pub fn with_detector(detector: D, config: ScanConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan a raster of any supported channel count.
    pub fn scan(&self, raster: &RasterImage) -> Result<ScanOutcome, ScanError> {
        let gray = luminance::to_grayscale(raster)?;
        self.scan_gray(&gray)
    }

    /// Scan an image that is already single-channel.
    pub fn scan_gray(&self, gray: &GrayImage) -> Result<ScanOutcome, ScanError> {
        if let Some(&bad) = self
            .config
            .scales
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(ScanError::InvalidScale(bad));
        }

        let started = Instant::now();
        let mut outcome = ScanOutcome::default();
        let mut seen = HashSet::new();

        let found = self.run_pass(ScanPass::Native, gray, &self.config.native_options())?;
        outcome.passes_run += 1;
        outcome.merge(&mut seen, ScanPass::Native, found);

        let scaled_options = self.config.scaled_options();
        for &factor in &self.config.scales {
            if let Some(timeout) = self.config.timeout {
                if started.elapsed() >= timeout {
                    log::debug!(
                        "deadline of {timeout:?} reached after {} pass(es)",
                        outcome.passes_run
                    );
                    outcome.timed_out = true;
                    break;
                }
            }

            let pass = ScanPass::Scaled(factor);
            let scaled = resize::rescale(gray, factor, self.config.filter)
                .ok_or(ScanError::InvalidScale(factor))?;
            let found = self.run_pass(pass, &scaled, &scaled_options)?;
            outcome.passes_run += 1;
            outcome.merge(&mut seen, pass, found);
        }

        log::debug!(
            "scan finished: {} unique result(s) from {} pass(es) in {:?}",
            outcome.len(),
            outcome.passes_run,
            started.elapsed()
        );
        Ok(outcome)
    }

    /// Run the detector once, turning a panic into a [`DetectError`].
    fn run_pass(
        &self,
        pass: ScanPass,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DecodedBarcode>, ScanError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.detector.detect(image, options)))
            .unwrap_or_else(|payload| Err(DetectError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(found) => {
                log::debug!(
                    "{pass} pass ({}x{}): {} symbol(s)",
                    image.width(),
                    image.height(),
                    found.len()
                );
                Ok(found)
            }
            Err(source) => Err(ScanError::Detect { pass, source }),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::Channels;
    use crate::detect::{BarcodeFormat, Chain, ZxingDetector};
    use crate::test_support::{expand_channels, render_micro_qr, render_qr, side_by_side};
    use std::cell::RefCell;
    use std::time::Duration;

    /// What the scripted detector does on a given call.
    enum Step {
        Found(Vec<DecodedBarcode>),
        Fail,
        Panic,
    }

    /// Detector that replays a script, one step per call, and records its inputs.
    struct ScriptedDetector {
        steps: RefCell<Vec<Step>>,
        calls: RefCell<Vec<((u32, u32), DetectorOptions)>>,
    }

    impl ScriptedDetector {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: RefCell::new(steps.into_iter().rev().collect()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Detector for ScriptedDetector {
        fn detect(
            &self,
            image: &GrayImage,
            options: &DetectorOptions,
        ) -> Result<Vec<DecodedBarcode>, DetectError> {
            self.calls
                .borrow_mut()
                .push((image.dimensions(), options.clone()));
            match self.steps.borrow_mut().pop() {
                Some(Step::Found(found)) => Ok(found),
                Some(Step::Fail) => Err(DetectError::Backend("scripted failure".into())),
                Some(Step::Panic) => panic!("scripted panic"),
                None => Ok(Vec::new()),
            }
        }
    }

    fn qr(text: &str) -> DecodedBarcode {
        DecodedBarcode::new(text, BarcodeFormat::QrCode)
    }

    fn texts(outcome: &ScanOutcome) -> Vec<&str> {
        outcome.iter().map(|h| h.barcode.text.as_str()).collect()
    }

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([255]))
    }

    #[test]
    fn test_pass_schedule() {
        let detector = ScriptedDetector::new(vec![]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let outcome = scanner.scan_gray(&blank(100, 40)).unwrap();
        assert_eq!(outcome.passes_run(), 6);

        let calls = detector.calls.borrow();
        let dims: Vec<_> = calls.iter().map(|(d, _)| *d).collect();
        assert_eq!(
            dims,
            vec![(100, 40), (50, 20), (150, 60), (200, 80), (250, 100), (300, 120)]
        );

        // Downscale search only on the native pass
        let downscale: Vec<_> = calls.iter().map(|(_, o)| o.try_downscale).collect();
        assert_eq!(downscale, vec![true, false, false, false, false, false]);
        assert!(calls
            .iter()
            .all(|(_, o)| o.try_harder && o.try_rotate && o.try_invert && o.max_symbols == 20));
    }

    #[test]
    fn test_earliest_pass_wins() {
        let detector = ScriptedDetector::new(vec![
            Step::Found(vec![]),
            Step::Found(vec![qr("shared")]),
            Step::Found(vec![]),
            Step::Found(vec![qr("shared")]),
        ]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let outcome = scanner.scan_gray(&blank(20, 20)).unwrap();
        assert_eq!(outcome.len(), 1);
        let hit = outcome.iter().next().unwrap();
        assert_eq!(hit.pass, ScanPass::Scaled(0.5));
    }

    #[test]
    fn test_same_text_different_symbology_keeps_first() {
        let detector = ScriptedDetector::new(vec![
            Step::Found(vec![DecodedBarcode::new("42", BarcodeFormat::DataMatrix)]),
            Step::Found(vec![qr("42")]),
        ]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let barcodes = scanner.scan_gray(&blank(20, 20)).unwrap().into_barcodes();
        assert_eq!(barcodes, vec![DecodedBarcode::new("42", BarcodeFormat::DataMatrix)]);
    }

    #[test]
    fn test_duplicates_within_one_pass() {
        let detector = ScriptedDetector::new(vec![Step::Found(vec![qr("a"), qr("a"), qr("b")])]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let outcome = scanner.scan_gray(&blank(20, 20)).unwrap();
        assert_eq!(texts(&outcome), vec!["a", "b"]);
    }

    #[test]
    fn test_first_detected_order() {
        let detector = ScriptedDetector::new(vec![
            Step::Found(vec![qr("c")]),
            Step::Found(vec![]),
            Step::Found(vec![qr("a"), qr("c")]),
            Step::Found(vec![]),
            Step::Found(vec![qr("b"), qr("a")]),
            Step::Found(vec![qr("d")]),
        ]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let outcome = scanner.scan_gray(&blank(20, 20)).unwrap();
        assert_eq!(texts(&outcome), vec!["c", "a", "b", "d"]);
        let passes: Vec<_> = outcome.iter().map(|h| h.pass).collect();
        assert_eq!(
            passes,
            vec![
                ScanPass::Native,
                ScanPass::Scaled(1.5),
                ScanPass::Scaled(2.5),
                ScanPass::Scaled(3.0),
            ]
        );
    }

    #[test]
    fn test_empty_outcome_is_ok() {
        let detector = ScriptedDetector::new(vec![]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let outcome = scanner.scan_gray(&blank(20, 20)).unwrap();
        assert!(outcome.is_empty());
        assert!(!outcome.timed_out());
    }

    #[test]
    fn test_failure_discards_earlier_passes() {
        let detector = ScriptedDetector::new(vec![
            Step::Found(vec![qr("kept?")]),
            Step::Found(vec![]),
            Step::Fail,
        ]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let err = scanner.scan_gray(&blank(20, 20)).unwrap_err();
        assert!(matches!(
            err,
            ScanError::Detect {
                pass: ScanPass::Scaled(f),
                source: DetectError::Backend(_),
            } if f == 1.5
        ));
        // No retry, no further passes
        assert_eq!(detector.calls.borrow().len(), 3);
    }

    #[test]
    fn test_detector_panic_becomes_error() {
        let detector = ScriptedDetector::new(vec![Step::Panic]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());

        let err = scanner.scan_gray(&blank(20, 20)).unwrap_err();
        match err {
            ScanError::Detect {
                pass: ScanPass::Native,
                source: DetectError::Panicked(msg),
            } => assert_eq!(msg, "scripted panic"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_runs_native_pass_only() {
        let detector = ScriptedDetector::new(vec![Step::Found(vec![qr("fast")])]);
        let config = ScanConfig::new().with_timeout(Some(Duration::ZERO));
        let scanner = Scanner::with_detector(&detector, config);

        let outcome = scanner.scan_gray(&blank(20, 20)).unwrap();
        assert_eq!(outcome.passes_run(), 1);
        assert!(outcome.timed_out());
        assert_eq!(texts(&outcome), vec!["fast"]);
    }

    #[test]
    fn test_invalid_scale_rejected_before_detection() {
        let detector = ScriptedDetector::new(vec![]);
        let config = ScanConfig::new().with_scales([1.5, 0.0]);
        let scanner = Scanner::with_detector(&detector, config);

        let err = scanner.scan_gray(&blank(20, 20)).unwrap_err();
        assert!(matches!(err, ScanError::InvalidScale(s) if s == 0.0));
        assert!(detector.calls.borrow().is_empty());
    }

    #[test]
    fn test_color_raster_converted_once() {
        let detector = ScriptedDetector::new(vec![]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::new().with_scales([2.0]));
        let raster = RasterImage::new(10, 6, Channels::Rgba, vec![90; 10 * 6 * 4]);

        scanner.scan(&raster).unwrap();
        let calls = detector.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, (10, 6));
        assert_eq!(calls[1].0, (20, 12));
    }

    #[test]
    fn test_mismatched_raster_is_an_error() {
        let detector = ScriptedDetector::new(vec![]);
        let scanner = Scanner::with_detector(&detector, ScanConfig::default());
        let raster = RasterImage {
            width: 10,
            height: 10,
            channels: Channels::Gray,
            pixels: vec![255; 99],
        };

        let err = scanner.scan(&raster).unwrap_err();
        assert!(matches!(err, ScanError::Raster(AcquireError::BufferSize { .. })));
        assert!(detector.calls.borrow().is_empty());
    }

    #[test]
    fn test_scan_pass_display() {
        assert_eq!(ScanPass::Native.to_string(), "native");
        assert_eq!(ScanPass::Scaled(2.5).to_string(), "2.5x");
        assert_eq!(ScanPass::Scaled(2.0).to_string(), "2x");
    }

    // ------------------------------------------------------------------
    // End-to-end with the real backends
    // ------------------------------------------------------------------

    #[test]
    fn test_single_code_all_channel_counts() {
        let gray = render_qr("https://example.com/ticket/1234", 4);
        let (w, h) = gray.dimensions();

        for channels in [Channels::Gray, Channels::Rgb, Channels::Rgba] {
            let raster = RasterImage::new(w, h, channels, expand_channels(&gray, channels.count()));
            let outcome = Scanner::new().scan(&raster).unwrap();

            assert_eq!(outcome.len(), 1, "channels = {channels:?}");
            let hit = outcome.iter().next().unwrap();
            assert_eq!(hit.barcode.text, "https://example.com/ticket/1234");
            assert_eq!(hit.barcode.format, BarcodeFormat::QrCode);
            assert_eq!(hit.pass, ScanPass::Native);
        }
    }

    #[test]
    fn test_multiple_codes_each_once() {
        let img = side_by_side(&[render_qr("left", 4), render_qr("right", 4)]);
        let outcome = Scanner::new().scan_gray(&img).unwrap();

        let mut found = texts(&outcome);
        found.sort_unstable();
        assert_eq!(found, vec!["left", "right"]);
    }

    #[test]
    fn test_micro_qr_code() {
        let outcome = Scanner::new().scan_gray(&render_micro_qr("01234", 6)).unwrap();
        assert!(outcome
            .iter()
            .any(|h| h.barcode == DecodedBarcode::new("01234", BarcodeFormat::MicroQrCode)));
    }

    /// Backend that reports one fixed barcode on every call.
    struct Constant(DecodedBarcode);

    impl Detector for Constant {
        fn detect(
            &self,
            _image: &GrayImage,
            _options: &DetectorOptions,
        ) -> Result<Vec<DecodedBarcode>, DetectError> {
            Ok(vec![self.0.clone()])
        }
    }

    #[test]
    fn test_backends_disagreeing_on_symbology_yield_one_entry() {
        let img = render_qr("shared payload", 4);
        let aztec = DecodedBarcode::new("shared payload", BarcodeFormat::Aztec);

        let scanner = Scanner::with_detector(
            Chain::new(Constant(aztec.clone()), ZxingDetector::new()),
            ScanConfig::default(),
        );
        assert_eq!(scanner.scan_gray(&img).unwrap().into_barcodes(), vec![aztec.clone()]);

        let scanner = Scanner::with_detector(
            Chain::new(ZxingDetector::new(), Constant(aztec)),
            ScanConfig::default(),
        );
        assert_eq!(
            scanner.scan_gray(&img).unwrap().into_barcodes(),
            vec![DecodedBarcode::new("shared payload", BarcodeFormat::QrCode)]
        );
    }

    #[test]
    fn test_small_module_code_credited_to_first_decoding_pass() {
        // One pixel per module: whether the native pass reads it depends on
        // the backend, so compare against standalone detector runs
        let img = render_qr("tiny", 1);
        let config = ScanConfig::default();
        let detector = StandardDetector::default();

        let mut schedule = vec![(ScanPass::Native, img.clone(), config.native_options())];
        for &factor in &config.scales {
            let scaled = resize::rescale(&img, factor, config.filter).unwrap();
            schedule.push((ScanPass::Scaled(factor), scaled, config.scaled_options()));
        }
        let first_decoding = schedule
            .iter()
            .find(|(_, image, options)| {
                detector
                    .detect(image, options)
                    .unwrap()
                    .iter()
                    .any(|b| b.text == "tiny")
            })
            .map(|(pass, _, _)| *pass)
            .expect("some pass decodes the code");

        let outcome = Scanner::new().scan_gray(&img).unwrap();
        let hit = outcome.iter().find(|h| h.barcode.text == "tiny").unwrap();
        assert_eq!(hit.pass, first_decoding);
    }

    #[test]
    fn test_mixed_module_sizes() {
        let img = side_by_side(&[render_qr("coarse", 6), render_qr("fine", 1)]);
        let outcome = Scanner::new().scan_gray(&img).unwrap();

        let mut found = texts(&outcome);
        found.sort_unstable();
        assert_eq!(found, vec!["coarse", "fine"]);
    }

    #[test]
    fn test_no_codes_real_backend() {
        let outcome = Scanner::new().scan_gray(&blank(64, 64)).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.passes_run(), 6);
    }
}
