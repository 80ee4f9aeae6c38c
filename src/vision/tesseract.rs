//! Tesseract OCR backend
//!
//! Runs the `tesseract` command line tool on a temporary PNG of the
//! preprocessed image and reads the recognized text from its stdout.
//! Dropping a recognition midway kills the child and removes the PNG.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use super::{prepare_for_ocr, OcrFacility};
use crate::config::OcrPreprocessing;

/// OCR through an installed tesseract binary
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
    preprocessing: OcrPreprocessing,
    scratch_dir: PathBuf,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>, preprocessing: OcrPreprocessing) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            preprocessing,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the intermediate PNG handed to tesseract
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }
}

#[async_trait]
impl OcrFacility for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<String, String> {
        let image = image.clone();
        let preprocessing = self.preprocessing.clone();
        let scratch_dir = self.scratch_dir.clone();
        let input = tokio::task::spawn_blocking(move || write_input(&image, &preprocessing, &scratch_dir))
            .await
            .map_err(|e| format!("OCR input task failed: {}", e))??;

        debug!("Running {:?} on {:?} ({})", self.binary, input.path(), self.language);
        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output()
            .await;
        drop(input);

        let output = output.map_err(|e| format!("Failed to execute tesseract: {}", e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("Tesseract failed: {}", stderr.trim()));
        }

        let text = String::from_utf8(output.stdout).map_err(|e| format!("Invalid UTF-8 output: {}", e))?;
        Ok(text.trim().to_string())
    }
}

/// Preprocess `image` and write it to a PNG removed when the handle drops
fn write_input(image: &DynamicImage, preprocessing: &OcrPreprocessing, dir: &Path) -> Result<NamedTempFile, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("cannot create {:?}: {}", dir, e))?;
    let file = tempfile::Builder::new()
        .prefix("snapscan-ocr-")
        .suffix(".png")
        .tempfile_in(dir)
        .map_err(|e| format!("cannot create OCR input: {}", e))?;

    prepare_for_ocr(image, preprocessing)
        .save_with_format(file.path(), ImageFormat::Png)
        .map_err(|e| format!("cannot write OCR input: {}", e))?;
    Ok(file)
}
