//! Vision/OCR Layer
//!
//! Decodes the cropped image and hands it to an OCR backend. The engine
//! returns text exactly as the backend produced it; filtering is a separate,
//! configurable policy applied by the pipeline.

pub mod preprocess;
pub mod tesseract;

pub use preprocess::prepare_for_ocr;
pub use tesseract::TesseractOcr;

use async_trait::async_trait;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::capture::ImageReference;

/// Post-processing applied to recognized text before display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFilter {
    /// Show the text as recognized
    Verbatim,
    /// Keep ASCII digits only
    #[default]
    DigitsOnly,
}

impl TextFilter {
    /// Apply the filter; applying it twice gives the same result as once
    pub fn apply(&self, raw: &str) -> String {
        match self {
            TextFilter::Verbatim => raw.to_string(),
            TextFilter::DigitsOnly => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
        }
    }
}

/// Result of a recognition stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Text(String),
    Failed(String),
}

/// External text recognizer
#[async_trait]
pub trait OcrFacility: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    async fn recognize(&self, image: &DynamicImage) -> Result<String, String>;
}

/// Runs OCR on image references
pub struct RecognitionEngine {
    ocr: Arc<dyn OcrFacility>,
}

impl RecognitionEngine {
    pub fn new(ocr: Arc<dyn OcrFacility>) -> Self {
        Self { ocr }
    }

    /// Decode `image` and recognize its text
    pub async fn recognize(&self, image: &ImageReference) -> RecognitionOutcome {
        let start = Instant::now();
        let path = image.path().to_path_buf();

        let decoded = match tokio::task::spawn_blocking(move || decode_image(&path)).await {
            Ok(Ok(decoded)) => decoded,
            Ok(Err(reason)) => {
                warn!("Could not decode {}: {}", image.uri(), reason);
                return RecognitionOutcome::Failed(reason);
            }
            Err(e) => return RecognitionOutcome::Failed(format!("decode task failed: {}", e)),
        };

        debug!(
            "Running {} OCR on {}x{} image",
            self.ocr.name(),
            decoded.width(),
            decoded.height()
        );

        match self.ocr.recognize(&decoded).await {
            Ok(text) => {
                info!(
                    "Recognized {} characters in {:?}",
                    text.chars().count(),
                    start.elapsed()
                );
                RecognitionOutcome::Text(text)
            }
            Err(reason) => {
                warn!("{} OCR failed: {}", self.ocr.name(), reason);
                RecognitionOutcome::Failed(reason)
            }
        }
    }
}

/// Decode an image file, sniffing the format from its contents
///
/// Capture files carry a `.jpg` name whatever the camera actually wrote.
pub fn decode_image(path: &Path) -> Result<DynamicImage, String> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| format!("decode error: cannot read {}: {}", path.display(), e))?
        .decode()
        .map_err(|e| format!("decode error: {}", e))
}
