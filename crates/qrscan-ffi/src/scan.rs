//! Exported scan entry points.
//!
//! All four functions are synchronous: the scan runs on the calling thread and
//! the function returns when it is done. Any failure (unreadable image, bad
//! arguments, detector error or panic) returns null. A successful scan that
//! finds nothing returns a result with `count == 0`.

use std::ffi::CStr;
use std::path::PathBuf;
use std::slice;

use libc::{c_char, c_int};
use qrscan_core::{acquire, RasterImage, RasterLayout, ScanConfig, Scanner};

use crate::error::FfiError;
use crate::marshal;
use crate::runtime::run_guarded;
use crate::types::{read_config, ScanResult, ScannerConfig};

#[cfg(unix)]
fn path_from_c(path: &CStr) -> Result<PathBuf, FfiError> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    match path.to_bytes() {
        [] => Err(FfiError::InvalidPath),
        bytes => Ok(PathBuf::from(OsStr::from_bytes(bytes))),
    }
}

#[cfg(not(unix))]
fn path_from_c(path: &CStr) -> Result<PathBuf, FfiError> {
    match path.to_str() {
        Ok(s) if !s.is_empty() => Ok(PathBuf::from(s)),
        _ => Err(FfiError::InvalidPath),
    }
}

fn scan_to_raw(raster: &RasterImage, config: ScanConfig) -> Result<*mut ScanResult, FfiError> {
    let outcome = Scanner::with_config(config).scan(raster)?;
    marshal::into_raw(outcome.into_barcodes())
}

/// Scan an image file with the default policy.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn scan_image(path: *const c_char) -> *mut ScanResult {
    scan_image_with_config(path, std::ptr::null())
}

/// Scan an image file with an optional policy override.
///
/// Returns null if `path` is null, the file cannot be read or decoded, or the
/// scan fails.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string. `config` must be null
/// or point to a valid `ScannerConfig`.
#[no_mangle]
pub unsafe extern "C" fn scan_image_with_config(
    path: *const c_char,
    config: *const ScannerConfig,
) -> *mut ScanResult {
    run_guarded("scan_image", || {
        if path.is_null() {
            return Err(FfiError::NullArgument("path"));
        }
        let path = path_from_c(CStr::from_ptr(path))?;
        let config = read_config(config);

        let raster = acquire::load_path(&path)?;
        scan_to_raw(&raster, config)
    })
}

/// Scan raw interleaved 8-bit pixels with the default policy.
///
/// # Safety
///
/// `data` must be null or point to at least `width * height * channels`
/// readable bytes for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn scan_bytes(
    data: *const u8,
    width: c_int,
    height: c_int,
    channels: c_int,
) -> *mut ScanResult {
    scan_bytes_with_config(data, width, height, channels, std::ptr::null())
}

/// Scan raw interleaved 8-bit pixels with an optional policy override.
///
/// `channels` must be 1 (gray), 3 (RGB) or 4 (RGBA). The buffer is copied
/// before scanning and is not referenced after the call returns.
///
/// # Safety
///
/// `data` must be null or point to at least `width * height * channels`
/// readable bytes for the duration of the call. `config` must be null or
/// point to a valid `ScannerConfig`.
#[no_mangle]
pub unsafe extern "C" fn scan_bytes_with_config(
    data: *const u8,
    width: c_int,
    height: c_int,
    channels: c_int,
    config: *const ScannerConfig,
) -> *mut ScanResult {
    run_guarded("scan_bytes", || {
        // Validate the layout before touching the buffer
        let layout = RasterLayout::validate(width, height, channels)?;
        if data.is_null() {
            return Err(FfiError::NullArgument("data"));
        }
        let config = read_config(config);

        let pixels = slice::from_raw_parts(data, layout.byte_len());
        let raster = acquire::from_raw(layout, pixels)?;
        scan_to_raw(&raster, config)
    })
}
