//! Variant search shared by the detector backends.
//!
//! Neither decoder has a notion of search effort, so the options are honored
//! by feeding each one extra copies of the image: inverted, rotated, and
//! downscaled. The results of all variants are deduplicated by text and capped.

use std::collections::HashSet;

use image::GrayImage;

use super::{DecodedBarcode, DetectError, DetectorOptions};

/// Shorter-side length above which downscaled copies are searched.
pub const DEFAULT_DOWNSCALE_THRESHOLD: u32 = 512;

/// An image transformation searched by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variant {
    Original,
    Inverted,
    Rotated,
    /// Shrunk by the given integer divisor.
    Downscaled(u32),
}

impl Variant {
    pub(crate) fn render(self, image: &GrayImage) -> GrayImage {
        match self {
            Variant::Original => image.clone(),
            Variant::Inverted => {
                let mut inverted = image.clone();
                image::imageops::invert(&mut inverted);
                inverted
            }
            Variant::Rotated => image::imageops::rotate90(image),
            Variant::Downscaled(divisor) => {
                let (w, h) = image.dimensions();
                image::imageops::thumbnail(image, (w / divisor).max(1), (h / divisor).max(1))
            }
        }
    }
}

/// List the variants to search, in order.
pub(crate) fn plan(
    width: u32,
    height: u32,
    options: &DetectorOptions,
    downscale_threshold: u32,
) -> Vec<Variant> {
    let mut variants = vec![Variant::Original];
    if options.try_invert {
        variants.push(Variant::Inverted);
    }
    if options.try_rotate {
        variants.push(Variant::Rotated);
    }
    if options.try_downscale {
        // Halve until the shorter side is at or below the threshold
        let mut side = width.min(height);
        let mut divisor = 1;
        while side > downscale_threshold {
            divisor *= 2;
            side /= 2;
            variants.push(Variant::Downscaled(divisor));
        }
    }
    variants
}

/// Run `decode` over every planned variant of `image`.
///
/// Stops early at `max_symbols`, or after the first productive variant when
/// `try_harder` is off. Formats the options do not accept are dropped before
/// they count against the cap.
pub(crate) fn search<F>(
    image: &GrayImage,
    options: &DetectorOptions,
    downscale_threshold: u32,
    mut decode: F,
) -> Result<Vec<DecodedBarcode>, DetectError>
where
    F: FnMut(&GrayImage) -> Result<Vec<DecodedBarcode>, DetectError>,
{
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::EmptyImage { width, height });
    }

    let mut found = Vec::new();
    if options.max_symbols == 0 {
        return Ok(found);
    }

    let mut seen = HashSet::new();
    for variant in plan(width, height, options, downscale_threshold) {
        if found.len() >= options.max_symbols {
            break;
        }
        if !options.try_harder && !found.is_empty() {
            break;
        }

        let decoded = decode(&variant.render(image))?;
        log::trace!("{variant:?}: {} symbol(s) decoded", decoded.len());

        for barcode in decoded {
            if found.len() >= options.max_symbols {
                break;
            }
            if options.accepts(barcode.format) && seen.insert(barcode.text.clone()) {
                found.push(barcode);
            }
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BarcodeFormat;

    fn qr(text: &str) -> DecodedBarcode {
        DecodedBarcode::new(text, BarcodeFormat::QrCode)
    }

    #[test]
    fn test_plan_order() {
        let variants = plan(450, 300, &DetectorOptions::default(), 100);
        assert_eq!(
            variants,
            vec![
                Variant::Original,
                Variant::Inverted,
                Variant::Rotated,
                Variant::Downscaled(2),
                Variant::Downscaled(4),
            ]
        );
    }

    #[test]
    fn test_plan_respects_flags() {
        let opts = DetectorOptions {
            try_invert: false,
            try_rotate: false,
            try_downscale: false,
            ..Default::default()
        };
        assert_eq!(plan(1000, 1000, &opts, 100), vec![Variant::Original]);
    }

    #[test]
    fn test_small_image_skips_downscale() {
        let variants = plan(400, 300, &DetectorOptions::default(), DEFAULT_DOWNSCALE_THRESHOLD);
        assert!(!variants
            .iter()
            .any(|v| matches!(v, Variant::Downscaled(_))));
    }

    #[test]
    fn test_render_dimensions() {
        let img = GrayImage::new(100, 60);
        assert_eq!(Variant::Downscaled(4).render(&img).dimensions(), (25, 15));
        assert_eq!(Variant::Rotated.render(&img).dimensions(), (60, 100));
    }

    #[test]
    fn test_search_empty_image_errors() {
        let result = search(&GrayImage::new(0, 10), &DetectorOptions::default(), 512, |_| {
            Ok(Vec::new())
        });
        assert!(matches!(result, Err(DetectError::EmptyImage { .. })));
    }

    #[test]
    fn test_search_dedupes_and_caps() {
        let img = GrayImage::new(20, 20);
        let mut calls = 0;
        let found = search(&img, &DetectorOptions::default(), 512, |_| {
            calls += 1;
            Ok(vec![qr("a"), qr("a"), qr(&format!("v{calls}"))])
        })
        .unwrap();
        // Original, inverted, rotated
        assert_eq!(calls, 3);
        let texts: Vec<_> = found.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "v1", "v2", "v3"]);

        let opts = DetectorOptions {
            max_symbols: 2,
            ..Default::default()
        };
        let capped = search(&img, &opts, 512, |_| Ok(vec![qr("a"), qr("b"), qr("c")])).unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn test_search_stops_at_first_hit_without_try_harder() {
        let img = GrayImage::new(20, 20);
        let opts = DetectorOptions {
            try_harder: false,
            ..Default::default()
        };
        let mut calls = 0;
        let found = search(&img, &opts, 512, |_| {
            calls += 1;
            Ok(vec![qr("only")])
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_search_filters_before_cap() {
        let img = GrayImage::new(20, 20);
        let opts = DetectorOptions {
            formats: vec![BarcodeFormat::Code128],
            max_symbols: 1,
            ..Default::default()
        };
        let found = search(&img, &opts, 512, |_| {
            Ok(vec![qr("skipped"), DecodedBarcode::new("kept", BarcodeFormat::Code128)])
        })
        .unwrap();
        assert_eq!(found, vec![DecodedBarcode::new("kept", BarcodeFormat::Code128)]);
    }

    #[test]
    fn test_search_propagates_decode_error() {
        let img = GrayImage::new(20, 20);
        let result = search(&img, &DetectorOptions::default(), 512, |_| {
            Err(DetectError::Backend("broken".into()))
        });
        assert!(matches!(result, Err(DetectError::Backend(_))));
    }
}
