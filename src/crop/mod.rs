//! Crop Layer
//!
//! Hands a captured image to the crop facility and checks what comes back.
//! Recognition only ever runs on an image the user confirmed here.

pub mod image_cropper;
pub mod region;

pub use image_cropper::{CropEdits, ImageCropper};
pub use region::{CropRegion, Rotation};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::capture::ImageReference;

/// When crop guidelines are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidelines {
    #[default]
    On,
    OnTouch,
    Off,
}

/// Shape of the crop window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropShape {
    #[default]
    Rectangle,
    Oval,
}

/// Options handed to the crop facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
    pub guidelines: Guidelines,
    /// Lock the selection to `aspect_ratio`
    pub fixed_aspect_ratio: bool,
    /// Width to height, only used with `fixed_aspect_ratio`
    pub aspect_ratio: (u32, u32),
    pub shape: CropShape,
    pub allow_rotation: bool,
    pub allow_flipping: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            guidelines: Guidelines::On,
            fixed_aspect_ratio: false,
            aspect_ratio: (1, 1),
            shape: CropShape::Rectangle,
            allow_rotation: true,
            allow_flipping: true,
        }
    }
}

/// Result of a crop stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropOutcome {
    /// A new image holding the confirmed selection
    Completed(ImageReference),
    /// The user left without confirming
    Cancelled,
    Failed(String),
}

/// External facility that lets the user crop an image
#[async_trait]
pub trait CropFacility: Send + Sync {
    async fn crop(&self, source: &ImageReference, options: &CropOptions) -> CropOutcome;
}

/// Owns the life cycle of one crop
pub struct CropSession {
    cropper: Arc<dyn CropFacility>,
    options: CropOptions,
}

impl CropSession {
    pub fn new(cropper: Arc<dyn CropFacility>, options: CropOptions) -> Self {
        Self { cropper, options }
    }

    /// Crop `source`, yielding a new image reference on confirmation
    pub async fn start(&self, source: &ImageReference) -> CropOutcome {
        match source.verify() {
            Ok(true) => {}
            Ok(false) => {
                warn!("Capture {} changed on disk before cropping", source.id());
                return CropOutcome::Failed("source image changed since capture".to_string());
            }
            Err(e) => return CropOutcome::Failed(e.to_string()),
        }

        debug!(
            "Cropping {} (sha256 {}) with {:?}",
            source.uri(),
            source.fingerprint().unwrap_or("unknown"),
            self.options
        );
        let outcome = self.cropper.crop(source, &self.options).await;

        match outcome {
            CropOutcome::Completed(cropped) if cropped.id() == source.id() => {
                CropOutcome::Failed("crop facility returned the source image".to_string())
            }
            CropOutcome::Completed(cropped) => {
                info!("Crop completed: {}", cropped.uri());
                CropOutcome::Completed(cropped)
            }
            CropOutcome::Cancelled => {
                info!("Crop cancelled");
                CropOutcome::Cancelled
            }
            CropOutcome::Failed(reason) => {
                warn!("Crop failed: {}", reason);
                CropOutcome::Failed(reason)
            }
        }
    }
}
