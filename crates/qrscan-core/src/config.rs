//! Scan policy configuration.
//!
//! [`ScanConfig::default`] is the fixed policy: a native-resolution pass with
//! downscale search, then cubic-rescaled passes at 0.5x, 1.5x, 2x, 2.5x and 3x
//! without it, all with try-harder, rotation and inversion search and a
//! 20-symbol cap per pass.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::{DetectorOptions, DEFAULT_MAX_SYMBOLS};
use crate::resize::FilterType;

/// Scale factors for the rescaled passes, in pass order.
pub const DEFAULT_SCALES: [f64; 5] = [0.5, 1.5, 2.0, 2.5, 3.0];

/// Scan policy for [`crate::Scanner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum symbols reported by each detector pass.
    pub max_symbols: usize,
    /// Detector try-harder mode for every pass.
    pub try_harder: bool,
    /// Soft deadline, checked before each rescaled pass.
    pub timeout: Option<Duration>,
    /// Scale factors for the passes after the native one, in order.
    pub scales: Vec<f64>,
    /// Enable downscale search on the native pass only.
    pub downscale_on_native_pass: bool,
    /// Resampling filter for the rescaled passes.
    pub filter: FilterType,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_symbols: DEFAULT_MAX_SYMBOLS,
            try_harder: true,
            timeout: None,
            scales: DEFAULT_SCALES.to_vec(),
            downscale_on_native_pass: true,
            filter: FilterType::Cubic,
        }
    }
}

impl ScanConfig {
    /// Create the default scan policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-pass symbol cap. Zero keeps the default.
    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = if max_symbols == 0 {
            DEFAULT_MAX_SYMBOLS
        } else {
            max_symbols
        };
        self
    }

    pub fn with_try_harder(mut self, try_harder: bool) -> Self {
        self.try_harder = try_harder;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_scales(mut self, scales: impl Into<Vec<f64>>) -> Self {
        self.scales = scales.into();
        self
    }

    /// Total number of detector passes, native included.
    pub fn pass_count(&self) -> usize {
        1 + self.scales.len()
    }

    /// Detector options for the native-resolution pass.
    pub fn native_options(&self) -> DetectorOptions {
        DetectorOptions {
            formats: Vec::new(),
            try_harder: self.try_harder,
            try_rotate: true,
            try_downscale: self.downscale_on_native_pass,
            try_invert: true,
            max_symbols: self.max_symbols,
        }
    }

    /// Detector options for the rescaled passes.
    pub fn scaled_options(&self) -> DetectorOptions {
        DetectorOptions {
            try_downscale: false,
            ..self.native_options()
        }
    }
}
