//! C-compatible structures shared with the header.
//!
//! Layouts must stay in sync with `include/qrscan.h`.

use std::time::Duration;

use libc::{c_char, c_int};
use qrscan_core::ScanConfig;

/// One decoded symbol.
///
/// Both strings are NUL-terminated and owned by the enclosing [`ScanResult`].
#[repr(C)]
#[derive(Debug)]
pub struct ScanCode {
    /// Decoded payload text.
    pub content: *mut c_char,
    /// Symbology label, e.g. `"QRCode"`.
    pub format: *mut c_char,
}

/// The result of one scan call.
///
/// `results` is null exactly when `count` is zero.
#[repr(C)]
#[derive(Debug)]
pub struct ScanResult {
    pub results: *mut ScanCode,
    pub count: c_int,
}

/// Optional overrides for the scan policy.
///
/// - `max_symbols <= 0` keeps the default cap of 20 per pass
/// - `timeout_ms <= 0` means no deadline
/// - `try_harder` is a C boolean (0 = off, anything else = on)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    pub max_symbols: c_int,
    pub timeout_ms: c_int,
    pub try_harder: c_int,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_symbols: 20,
            timeout_ms: 0,
            try_harder: 1,
        }
    }
}

impl From<&ScannerConfig> for ScanConfig {
    fn from(config: &ScannerConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms as u64));

        ScanConfig::new()
            .with_max_symbols(usize::try_from(config.max_symbols).unwrap_or(0))
            .with_try_harder(config.try_harder != 0)
            .with_timeout(timeout)
    }
}

/// Read an optional config pointer into a core policy.
///
/// # Safety
///
/// `config` must be null or point to a valid `ScannerConfig`.
pub(crate) unsafe fn read_config(config: *const ScannerConfig) -> ScanConfig {
    match config.as_ref() {
        Some(config) => ScanConfig::from(config),
        None => ScanConfig::default(),
    }
}
