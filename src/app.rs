//! Application Coordinator
//!
//! Builds the pipeline and its desktop facilities from configuration, once,
//! and hands the controller its collaborators explicitly.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::capture::{CameraSignal, CaptureSession, FileCamera};
use crate::config::AppConfig;
use crate::crop::{CropEdits, CropSession, ImageCropper};
use crate::permission::{ConsentPolicy, ConsolePermission, PermissionGate};
use crate::pipeline::{Collaborators, ConsoleDisplay, DisplaySurface, PipelineController, PipelineOutcome};
use crate::storage::{self, PendingCaptureTicket, PhotoStore, TicketStore};
use crate::vision::{RecognitionEngine, TesseractOcr, TextFilter};

/// Per-invocation choices that override or extend the config
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Photo the file camera imports; `None` behaves like a cancelled camera
    pub source: Option<PathBuf>,
    pub edits: CropEdits,
    pub text_filter: Option<TextFilter>,
    pub consent: Option<ConsentPolicy>,
}

/// Main application coordinator
pub struct SnapScanApp {
    controller: PipelineController,
}

impl SnapScanApp {
    /// Wire the pipeline with the desktop facilities
    pub fn new(config: &AppConfig, options: SessionOptions) -> Result<Self> {
        let photo_dir = match &config.storage.photo_dir {
            Some(dir) => dir.clone(),
            None => storage::default_photo_dir()?,
        };
        let tickets = TicketStore::new(storage::ticket_path()?);
        let photos = PhotoStore::new(photo_dir, config.storage.retention).with_tickets(tickets.clone());
        let cache_dir = storage::get_cache_dir()?;

        let consent = options.consent.unwrap_or(config.permission.camera);
        let text_filter = options.text_filter.unwrap_or(config.recognition.text_filter);
        let recognition = &config.recognition;

        info!(
            "Captures in {:?} ({:?}), text filter {:?}",
            photos.dir(),
            photos.retention(),
            text_filter
        );

        let display: Arc<dyn DisplaySurface> = Arc::new(ConsoleDisplay);
        let parts = Collaborators {
            gate: PermissionGate::new(Arc::new(ConsolePermission::new(consent))),
            photos,
            capture: CaptureSession::new(Arc::new(FileCamera::new(options.source)), tickets),
            crop: CropSession::new(
                Arc::new(ImageCropper::new(cache_dir.join("crops"), options.edits)),
                config.crop.clone(),
            ),
            engine: RecognitionEngine::new(Arc::new(
                TesseractOcr::new(
                    &recognition.tesseract_path,
                    &recognition.language,
                    recognition.preprocessing.clone(),
                )
                .with_scratch_dir(cache_dir.join("ocr")),
            )),
            display,
        };

        Ok(Self {
            controller: PipelineController::new(parts, text_filter),
        })
    }

    /// The capture left pending by an interrupted run, if any
    pub fn pending_ticket(&self) -> Result<Option<PendingCaptureTicket>> {
        Ok(self.controller.pending_capture()?)
    }

    /// Run one capture attempt
    pub async fn capture(&mut self, cancel: &CancellationToken) -> PipelineOutcome {
        let outcome = self.controller.run(cancel).await;
        debug!(
            "Attempt finished in {:?} via {:?}",
            self.controller.state(),
            self.controller.trace()
        );
        outcome
    }

    /// Deliver a late camera result to the pending capture
    ///
    /// With `late_photo`, its bytes are first written to the pending
    /// destination, as the camera would have done.
    pub async fn resume(
        &mut self,
        signal: CameraSignal,
        late_photo: Option<PathBuf>,
        cancel: &CancellationToken,
    ) -> Result<Option<PipelineOutcome>> {
        if let (CameraSignal::Completed, Some(photo)) = (signal, &late_photo) {
            if let Some(ticket) = self.pending_ticket()? {
                tokio::fs::copy(photo, &ticket.destination)
                    .await
                    .with_context(|| format!("Failed to import {:?}", photo))?;
            }
        }

        Ok(self.controller.resume_capture(signal, cancel).await)
    }
}
