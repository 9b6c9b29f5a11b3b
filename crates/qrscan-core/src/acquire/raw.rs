//! Raw pixel buffer wrapping.

use super::{AcquireError, RasterImage, RasterLayout};

/// Copy a caller-owned pixel buffer into a [`RasterImage`].
///
/// Pixels are taken as-is, without transcoding. Only the first
/// `layout.byte_len()` bytes are used; trailing bytes (row padding the caller
/// did not declare) are ignored.
///
/// # Errors
///
/// Returns `AcquireError::BufferSize` if `data` is shorter than the layout.
pub fn from_raw(layout: RasterLayout, data: &[u8]) -> Result<RasterImage, AcquireError> {
    let expected = layout.byte_len();
    if data.len() < expected {
        return Err(AcquireError::BufferSize {
            expected,
            actual: data.len(),
        });
    }

    Ok(RasterImage::new(
        layout.width,
        layout.height,
        layout.channels,
        data[..expected].to_vec(),
    ))
}
