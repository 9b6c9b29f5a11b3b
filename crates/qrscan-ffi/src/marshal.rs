//! Result buffer construction and release.
//!
//! A result is three layers of allocation: the `ScanResult` box, a boxed slice
//! of `ScanCode`, and two `CString`s per code. [`free_result`] releases them
//! strictly inner to outer: strings, then the array, then the struct.

use std::ffi::CString;
use std::ptr;

use libc::c_int;
use qrscan_core::DecodedBarcode;

use crate::error::FfiError;
use crate::types::{ScanCode, ScanResult};

/// Copy `text` into a C string, cutting it at the first interior NUL.
fn to_c_string(text: &str) -> CString {
    let visible = text.split('\0').next().unwrap_or_default();
    CString::new(visible).unwrap_or_default()
}

/// Move decoded barcodes into a heap-allocated, caller-owned result.
///
/// An empty list yields `count == 0` and a null `results` pointer.
pub(crate) fn into_raw(barcodes: Vec<DecodedBarcode>) -> Result<*mut ScanResult, FfiError> {
    let count = c_int::try_from(barcodes.len())
        .map_err(|_| FfiError::TooManyResults(barcodes.len()))?;

    let results = if barcodes.is_empty() {
        ptr::null_mut()
    } else {
        let codes: Box<[ScanCode]> = barcodes
            .iter()
            .map(|barcode| ScanCode {
                content: to_c_string(&barcode.text).into_raw(),
                format: to_c_string(barcode.format.label()).into_raw(),
            })
            .collect();
        Box::into_raw(codes) as *mut ScanCode
    };

    Ok(Box::into_raw(Box::new(ScanResult { results, count })))
}

/// Release a result returned by any scan entry point.
///
/// Null is a no-op. A result with a null `results` array releases only the
/// top-level structure.
///
/// # Safety
///
/// `result` must be null or a pointer returned by this library that has not
/// been freed yet. The pointer must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn free_result(result: *mut ScanResult) {
    if result.is_null() {
        return;
    }

    let result = Box::from_raw(result);
    if !result.results.is_null() && result.count > 0 {
        let codes = Box::from_raw(ptr::slice_from_raw_parts_mut(
            result.results,
            result.count as usize,
        ));
        for code in codes.iter() {
            if !code.content.is_null() {
                drop(CString::from_raw(code.content));
            }
            if !code.format.is_null() {
                drop(CString::from_raw(code.format));
            }
        }
        drop(codes);
    }
    drop(result);
}
