//! Scripted facilities for exercising the pipeline without hardware

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::display::{DisplaySurface, Notice};
use crate::capture::{CameraFacility, CameraSignal, ImageReference};
use crate::crop::{CropFacility, CropOptions, CropOutcome};
use crate::permission::{AuthorizationOutcome, Capability, PermissionFacility};
use crate::storage::DestinationHandle;
use crate::vision::OcrFacility;

/// Answers every request the same way
pub struct ScriptedPermission {
    outcome: AuthorizationOutcome,
    requests: AtomicUsize,
}

impl ScriptedPermission {
    pub fn new(outcome: AuthorizationOutcome) -> Self {
        Self {
            outcome,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionFacility for ScriptedPermission {
    async fn request(&self, _capability: Capability) -> AuthorizationOutcome {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }
}

enum CameraBehavior {
    Write(Vec<u8>),
    Cancel,
    Fail(String),
    Pend,
}

pub struct ScriptedCamera {
    behavior: CameraBehavior,
    calls: AtomicUsize,
}

impl ScriptedCamera {
    fn with(behavior: CameraBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Writes `bytes` into the destination and completes
    pub fn writes(bytes: &[u8]) -> Self {
        Self::with(CameraBehavior::Write(bytes.to_vec()))
    }

    pub fn cancels() -> Self {
        Self::with(CameraBehavior::Cancel)
    }

    pub fn fails(reason: &str) -> Self {
        Self::with(CameraBehavior::Fail(reason.to_string()))
    }

    /// Never answers, like a camera app left open
    pub fn pends() -> Self {
        Self::with(CameraBehavior::Pend)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraFacility for ScriptedCamera {
    async fn capture(&self, destination: &DestinationHandle) -> Result<CameraSignal, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            CameraBehavior::Write(bytes) => {
                std::fs::write(destination.path(), bytes).map_err(|e| e.to_string())?;
                Ok(CameraSignal::Completed)
            }
            CameraBehavior::Cancel => Ok(CameraSignal::Cancelled),
            CameraBehavior::Fail(reason) => Err(reason.clone()),
            CameraBehavior::Pend => std::future::pending().await,
        }
    }
}

enum CropBehavior {
    Complete(PathBuf),
    Echo,
    Cancel,
    Fail(String),
    Pend,
}

pub struct ScriptedCropper {
    behavior: CropBehavior,
    calls: AtomicUsize,
    received: Mutex<Option<Vec<u8>>>,
}

impl ScriptedCropper {
    fn with(behavior: CropBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            received: Mutex::new(None),
        }
    }

    /// Writes a small PNG to `output` and returns it as the crop
    pub fn completes(output: PathBuf) -> Self {
        Self::with(CropBehavior::Complete(output))
    }

    /// Hands the source reference straight back
    pub fn echoes() -> Self {
        Self::with(CropBehavior::Echo)
    }

    pub fn cancels() -> Self {
        Self::with(CropBehavior::Cancel)
    }

    pub fn fails(reason: &str) -> Self {
        Self::with(CropBehavior::Fail(reason.to_string()))
    }

    pub fn pends() -> Self {
        Self::with(CropBehavior::Pend)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bytes behind the source reference at the time of the last call
    pub fn received_bytes(&self) -> Option<Vec<u8>> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl CropFacility for ScriptedCropper {
    async fn crop(&self, source: &ImageReference, _options: &CropOptions) -> CropOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.received.lock() = std::fs::read(source.path()).ok();

        match &self.behavior {
            CropBehavior::Complete(output) => {
                let image = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
                match image.save_with_format(output, ImageFormat::Png) {
                    Ok(()) => CropOutcome::Completed(ImageReference::new(output)),
                    Err(e) => CropOutcome::Failed(e.to_string()),
                }
            }
            CropBehavior::Echo => CropOutcome::Completed(source.clone()),
            CropBehavior::Cancel => CropOutcome::Cancelled,
            CropBehavior::Fail(reason) => CropOutcome::Failed(reason.clone()),
            CropBehavior::Pend => std::future::pending().await,
        }
    }
}

pub struct ScriptedOcr {
    result: Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedOcr {
    pub fn text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fails(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrFacility for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, _image: &DynamicImage) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Remembers everything it was asked to show
#[derive(Default)]
pub struct RecordingDisplay {
    texts: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingDisplay {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl DisplaySurface for RecordingDisplay {
    fn show_text(&self, text: &str) {
        self.texts.lock().push(text.to_string());
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
