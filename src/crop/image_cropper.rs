//! Desktop crop facility
//!
//! Applies a pre-selected region, rotation and flips to the captured image
//! with the `image` crate and writes the result as PNG. Discarding the crop
//! stands in for closing the crop window.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba};
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CropFacility, CropOptions, CropOutcome, CropRegion, CropShape, Rotation};
use crate::capture::ImageReference;
use crate::vision::decode_image;

/// Edits the user chose for this crop
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropEdits {
    /// Selection, relative to the image after rotation and flips
    pub region: CropRegion,
    pub rotation: Rotation,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Back out without producing a crop
    pub discard: bool,
}

/// Crops into files under `output_dir`
pub struct ImageCropper {
    output_dir: PathBuf,
    edits: CropEdits,
}

impl ImageCropper {
    pub fn new(output_dir: impl Into<PathBuf>, edits: CropEdits) -> Self {
        Self {
            output_dir: output_dir.into(),
            edits,
        }
    }
}

#[async_trait]
impl CropFacility for ImageCropper {
    async fn crop(&self, source: &ImageReference, options: &CropOptions) -> CropOutcome {
        if self.edits.discard {
            debug!("Crop of {} discarded", source.uri());
            return CropOutcome::Cancelled;
        }

        let source_path = source.path().to_path_buf();
        let output = self.output_dir.join(format!("CROP_{}.png", Uuid::new_v4()));
        let output_dir = self.output_dir.clone();
        let edits = self.edits;
        let options = options.clone();

        let task = tokio::task::spawn_blocking(move || -> Result<PathBuf, String> {
            let image = decode_image(&source_path)?;
            let cropped = apply_edits(image, &edits, &options);

            std::fs::create_dir_all(&output_dir)
                .map_err(|e| format!("cannot create {}: {}", output_dir.display(), e))?;
            cropped
                .save_with_format(&output, ImageFormat::Png)
                .map_err(|e| format!("cannot write {}: {}", output.display(), e))?;
            Ok(output)
        });

        match task.await {
            Ok(Ok(path)) => {
                debug!("Wrote crop to {:?}", path);
                CropOutcome::Completed(ImageReference::new(path))
            }
            Ok(Err(reason)) => CropOutcome::Failed(reason),
            Err(e) => CropOutcome::Failed(format!("crop task failed: {}", e)),
        }
    }
}

/// Rotate, flip, then cut out the selection
///
/// Edits the options disallow are skipped.
pub fn apply_edits(image: DynamicImage, edits: &CropEdits, options: &CropOptions) -> DynamicImage {
    let mut image = image;

    if edits.rotation != Rotation::None {
        if options.allow_rotation {
            image = match edits.rotation {
                Rotation::None => image,
                Rotation::Cw90 => image.rotate90(),
                Rotation::Cw180 => image.rotate180(),
                Rotation::Cw270 => image.rotate270(),
            };
        } else {
            warn!("Rotation is disabled; ignoring {:?}", edits.rotation);
        }
    }

    if edits.flip_horizontal || edits.flip_vertical {
        if options.allow_flipping {
            if edits.flip_horizontal {
                image = image.fliph();
            }
            if edits.flip_vertical {
                image = image.flipv();
            }
        } else {
            warn!("Flipping is disabled; ignoring flips");
        }
    }

    let mut rect = edits.region.to_pixels(image.width(), image.height());
    if options.fixed_aspect_ratio {
        rect = rect.fit_aspect(options.aspect_ratio);
    }
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);

    match options.shape {
        CropShape::Rectangle => cropped,
        CropShape::Oval => mask_oval(cropped),
    }
}

/// Make everything outside the inscribed ellipse transparent
fn mask_oval(image: DynamicImage) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    let rx = rgba.width() as f32 / 2.0;
    let ry = rgba.height() as f32 / 2.0;

    for (x, y, pixel) in rgba.enumerate_pixels_mut() {
        let dx = (x as f32 + 0.5 - rx) / rx;
        let dy = (y as f32 + 0.5 - ry) / ry;
        if dx * dx + dy * dy > 1.0 {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    DynamicImage::ImageRgba8(rgba)
}
