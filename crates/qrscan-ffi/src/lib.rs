//! qrscan FFI - C ABI bindings for qrscan
//!
//! This crate exposes the qrscan-core scanner to C and to any host that can
//! call C functions (Dart FFI, Swift, Kotlin/JNI shims).
//!
//! # Module Structure
//!
//! - `types` - `#[repr(C)]` result and configuration structures
//! - `marshal` - building and releasing caller-owned result buffers
//! - `runtime` - one-time logging setup and panic containment
//! - `scan` - the exported entry points
//!
//! # Usage
//!
//! ```c
//! #include "qrscan.h"
//!
//! ScanResult *result = scan_image("/tmp/ticket.png");
//! if (result == NULL) {
//!     /* image could not be read, or the scan failed */
//! } else {
//!     for (int i = 0; i < result->count; i++) {
//!         printf("%s: %s\n", result->results[i].format, result->results[i].content);
//!     }
//!     free_result(result);
//! }
//! ```
//!
//! Every non-null `ScanResult*` must be released exactly once with
//! `free_result`. A result with `count == 0` always has `results == NULL`.

use libc::c_char;

mod error;
mod marshal;
mod runtime;
mod scan;
mod types;

pub use error::FfiError;
pub use marshal::free_result;
pub use scan::{scan_bytes, scan_bytes_with_config, scan_image, scan_image_with_config};
pub use types::{ScanCode, ScanResult, ScannerConfig};

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Get the library version as a static NUL-terminated string.
///
/// The returned pointer is valid for the life of the process and must not be
/// freed.
#[no_mangle]
pub extern "C" fn scan_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}
