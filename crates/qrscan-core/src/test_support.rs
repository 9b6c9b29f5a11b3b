//! Synthetic QR fixtures for tests.
//!
//! Compiled for this crate's own tests and, through the `test-support`
//! feature, for the tests of crates built on top of it.

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode, Version};

/// Quiet zone around each rendered code, in modules.
const QUIET_ZONE: u32 = 4;

fn rasterize(code: &QrCode, module_px: u32) -> GrayImage {
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * module_px;

    GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / module_px) as i64 - QUIET_ZONE as i64;
        let my = (y / module_px) as i64 - QUIET_ZONE as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Render `text` as a black-on-white QR code with `module_px` pixels per module.
pub fn render_qr(text: &str, module_px: u32) -> GrayImage {
    let code = QrCode::new(text.as_bytes()).expect("text fits in a QR code");
    rasterize(&code, module_px)
}

/// Render `text` as an M2 Micro QR code (up to 10 digits).
pub fn render_micro_qr(text: &str, module_px: u32) -> GrayImage {
    let code = QrCode::with_version(text.as_bytes(), Version::Micro(2), EcLevel::L)
        .expect("text fits in an M2 Micro QR code");
    rasterize(&code, module_px)
}

/// Lay images out left to right on a white canvas, separated by a gap.
pub fn side_by_side(images: &[GrayImage]) -> GrayImage {
    const GAP: u32 = 24;
    let width = images.iter().map(|i| i.width() + GAP).sum::<u32>() + GAP;
    let height = images.iter().map(|i| i.height()).max().unwrap_or(0) + 2 * GAP;

    let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
    let mut x = GAP as i64;
    for img in images {
        image::imageops::replace(&mut canvas, img, x, GAP as i64);
        x += (img.width() + GAP) as i64;
    }
    canvas
}

/// Expand a grayscale image to interleaved RGB or RGBA bytes.
pub fn expand_channels(gray: &GrayImage, channels: usize) -> Vec<u8> {
    gray.pixels()
        .flat_map(|p| {
            let v = p.0[0];
            match channels {
                3 => vec![v, v, v],
                4 => vec![v, v, v, 255],
                _ => vec![v],
            }
        })
        .collect()
}
