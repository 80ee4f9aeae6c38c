//! Image preprocessing filters for OCR
//!
//! Optional enhancements applied before the image reaches the OCR backend.
//! Small crops are upscaled so that glyphs are tall enough to be detected.

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::config::OcrPreprocessing;

/// Smallest side, in pixels, that OCR handles reliably
const MIN_OCR_DIMENSION: u32 = 80;

/// Upscale factor for a region of the given size (1 when no upscaling is needed)
pub fn auto_upscale_factor(width: u32, height: u32) -> u32 {
    if width == 0 || height == 0 {
        return 1;
    }
    if height >= MIN_OCR_DIMENSION && width >= MIN_OCR_DIMENSION {
        return 1;
    }

    let height_scale = MIN_OCR_DIMENSION.div_ceil(height);
    let width_scale = MIN_OCR_DIMENSION.div_ceil(width);
    height_scale.max(width_scale).clamp(2, 4)
}

/// Apply the configured filters, returning a new image
pub fn prepare_for_ocr(image: &DynamicImage, settings: &OcrPreprocessing) -> DynamicImage {
    if !settings.enabled {
        return image.clone();
    }

    let auto = if settings.auto_upscale {
        auto_upscale_factor(image.width(), image.height())
    } else {
        1
    };
    let scale = settings.scale.max(auto).max(1);

    debug!(
        "OCR preprocessing: scale={}, grayscale={}, contrast={}, sharpen={}, equalize={}, invert={}",
        scale, settings.grayscale, settings.contrast, settings.sharpen, settings.equalize, settings.invert
    );

    // Upscale first so later filters work on the final resolution
    let mut result = if scale > 1 {
        image.resize_exact(image.width() * scale, image.height() * scale, FilterType::CatmullRom)
    } else {
        image.clone()
    };

    if (settings.contrast - 1.0).abs() > 0.01 {
        result = result.adjust_contrast((settings.contrast - 1.0) * 100.0);
    }

    if settings.sharpen > 0.01 {
        result = result.unsharpen(1.0 + settings.sharpen, 1);
    }

    if settings.equalize {
        result = DynamicImage::ImageLuma8(imageproc::contrast::equalize_histogram(&result.to_luma8()));
    } else if settings.grayscale {
        result = result.grayscale();
    }

    if settings.invert {
        result.invert();
    }

    result
}
