//! Image acquisition for the scan pipeline.
//!
//! This module provides the two ways a raster reaches the scanner:
//! - Decoding an image file from disk (any format the `image` crate was built with)
//! - Wrapping caller-supplied pixel bytes with a declared layout
//!
//! # Ownership
//!
//! Both paths return an owned [`RasterImage`]. Raw pixel input is copied, so the
//! caller's buffer only has to outlive the synchronous call that wraps it.
//!
//! # Examples
//!
//! ```ignore
//! use qrscan_core::acquire::{from_raw, RasterLayout};
//!
//! let layout = RasterLayout::validate(640, 480, 4)?;
//! let raster = from_raw(layout, &rgba_bytes)?;
//! assert_eq!(raster.width, 640);
//! ```

mod file;
mod raw;
mod types;

pub use file::load_path;
pub use raw::from_raw;
pub use types::{AcquireError, Channels, RasterImage, RasterLayout};
