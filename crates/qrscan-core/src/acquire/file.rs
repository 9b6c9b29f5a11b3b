//! Image file decoding.

use std::path::Path;

use image::ImageReader;

use super::{AcquireError, RasterImage};

/// Load and decode an image file.
///
/// The format is guessed from the file contents rather than the extension, so
/// a mislabeled PNG still decodes.
///
/// # Errors
///
/// Returns `AcquireError::Io` if the file cannot be opened or read, and
/// `AcquireError::Decode` if the contents are not a supported image.
pub fn load_path(path: impl AsRef<Path>) -> Result<RasterImage, AcquireError> {
    let path = path.as_ref();
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;

    log::debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Ok(RasterImage::from_dynamic(img))
}
