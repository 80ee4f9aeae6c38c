//! Pipeline controller
//!
//! Runs one attempt through permission, capture, crop, recognition and
//! display, strictly in that order. Each stage is raced against the attempt's
//! cancellation token; once a stage ends in cancellation or failure the
//! attempt is over and the controller is back in [`PipelineState::Idle`].

use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::display::{DisplaySurface, Notice};
use super::error::PipelineError;
use crate::capture::{CameraSignal, CaptureOutcome, CaptureSession, ImageReference};
use crate::crop::{CropOutcome, CropSession};
use crate::permission::{AuthorizationOutcome, PermissionGate};
use crate::storage::{PendingCaptureTicket, PhotoStore};
use crate::vision::{RecognitionEngine, RecognitionOutcome, TextFilter};

/// Where the controller is in the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AwaitingPermission,
    Capturing,
    Cropping,
    Recognizing,
    Displaying,
}

impl PipelineState {
    /// Stages only move forward one step at a time, or back to idle
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Idle, AwaitingPermission)
            | (AwaitingPermission, Capturing)
            | (Capturing, Cropping)
            | (Cropping, Recognizing)
            | (Recognizing, Displaying) => true,
            (Idle, Idle) => false,
            (_, Idle) => true,
            _ => false,
        }
    }
}

/// Suspension-bearing unit of pipeline work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Permission,
    Capture,
    Crop,
    Recognition,
}

/// Terminal outcome of one attempt
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Text (after filtering) was rendered
    Displayed(String),
    /// The user backed out; nothing was reported
    Cancelled(Stage),
    /// Reported to the user once as an error notice
    Failed(PipelineError),
}

/// Everything the controller delegates to
pub struct Collaborators {
    pub gate: PermissionGate,
    pub photos: PhotoStore,
    pub capture: CaptureSession,
    pub crop: CropSession,
    pub engine: RecognitionEngine,
    pub display: Arc<dyn DisplaySurface>,
}

pub struct PipelineController {
    gate: PermissionGate,
    photos: PhotoStore,
    capture: CaptureSession,
    crop: CropSession,
    engine: RecognitionEngine,
    display: Arc<dyn DisplaySurface>,
    text_filter: TextFilter,
    state: PipelineState,
    trace: Vec<PipelineState>,
}

impl PipelineController {
    pub fn new(parts: Collaborators, text_filter: TextFilter) -> Self {
        Self {
            gate: parts.gate,
            photos: parts.photos,
            capture: parts.capture,
            crop: parts.crop,
            engine: parts.engine,
            display: parts.display,
            text_filter,
            state: PipelineState::Idle,
            trace: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// States visited by the most recent attempt
    pub fn trace(&self) -> &[PipelineState] {
        &self.trace
    }

    /// The capture left pending by an interrupted attempt, if any
    pub fn pending_capture(&self) -> Result<Option<PendingCaptureTicket>, PipelineError> {
        self.capture.pending()
    }

    /// Run one attempt, starting from the user's capture request
    pub async fn run(&mut self, cancel: &CancellationToken) -> PipelineOutcome {
        self.reset_if_interrupted();
        self.trace = vec![PipelineState::Idle];

        let outcome = self.attempt(cancel).await;
        self.finish(outcome)
    }

    /// Continue an attempt whose capture outlived the previous process
    ///
    /// Returns `None` when no capture was pending.
    pub async fn resume_capture(
        &mut self,
        signal: CameraSignal,
        cancel: &CancellationToken,
    ) -> Option<PipelineOutcome> {
        self.reset_if_interrupted();

        let resolved = match self.capture.resume(signal) {
            Ok(None) => return None,
            Ok(Some(outcome)) => Ok(outcome),
            Err(e) => Err(e),
        };

        info!("Restoring pipeline in {:?}", PipelineState::Capturing);
        self.state = PipelineState::Capturing;
        self.trace = vec![PipelineState::Capturing];

        let outcome = match resolved {
            Ok(CaptureOutcome::Completed(captured)) => self.after_capture(captured, cancel).await,
            Ok(CaptureOutcome::Cancelled) => PipelineOutcome::Cancelled(Stage::Capture),
            Err(e) => PipelineOutcome::Failed(e),
        };
        Some(self.finish(outcome))
    }

    async fn attempt(&mut self, cancel: &CancellationToken) -> PipelineOutcome {
        self.advance(PipelineState::AwaitingPermission);
        match run_stage(cancel, self.gate.ensure_capture_authorized()).await {
            None => return PipelineOutcome::Cancelled(Stage::Permission),
            Some(AuthorizationOutcome::Denied) => {
                return PipelineOutcome::Failed(PipelineError::PermissionDenied)
            }
            Some(AuthorizationOutcome::Granted) => {}
        }

        if cancel.is_cancelled() {
            return PipelineOutcome::Cancelled(Stage::Capture);
        }

        self.advance(PipelineState::Capturing);
        let destination = match self.photos.allocate() {
            Ok(destination) => destination,
            Err(e) => return PipelineOutcome::Failed(e.into()),
        };

        let captured = match run_stage(cancel, self.capture.start(destination)).await {
            None => {
                if let Err(e) = self.capture.abandon() {
                    warn!("Failed to clear pending capture: {}", e);
                }
                return PipelineOutcome::Cancelled(Stage::Capture);
            }
            Some(Err(e)) => return PipelineOutcome::Failed(e),
            Some(Ok(CaptureOutcome::Cancelled)) => return PipelineOutcome::Cancelled(Stage::Capture),
            Some(Ok(CaptureOutcome::Completed(captured))) => captured,
        };

        self.after_capture(captured, cancel).await
    }

    async fn after_capture(&mut self, captured: ImageReference, cancel: &CancellationToken) -> PipelineOutcome {
        self.advance(PipelineState::Cropping);
        let cropped = match run_stage(cancel, self.crop.start(&captured)).await {
            None | Some(CropOutcome::Cancelled) => return PipelineOutcome::Cancelled(Stage::Crop),
            Some(CropOutcome::Failed(reason)) => {
                return PipelineOutcome::Failed(PipelineError::CropFailed(reason))
            }
            Some(CropOutcome::Completed(cropped)) => cropped,
        };

        self.advance(PipelineState::Recognizing);
        let raw = match run_stage(cancel, self.engine.recognize(&cropped)).await {
            None => return PipelineOutcome::Cancelled(Stage::Recognition),
            Some(RecognitionOutcome::Failed(reason)) => {
                return PipelineOutcome::Failed(PipelineError::RecognitionFailed(reason))
            }
            Some(RecognitionOutcome::Text(raw)) => raw,
        };

        self.advance(PipelineState::Displaying);
        let text = self.text_filter.apply(&raw);
        debug!("Applied {:?} filter: {:?} -> {:?}", self.text_filter, raw, text);
        self.display.show_text(&text);

        self.photos.release(captured.path());
        PipelineOutcome::Displayed(text)
    }

    /// Report the outcome and return to idle
    fn finish(&mut self, outcome: PipelineOutcome) -> PipelineOutcome {
        match &outcome {
            PipelineOutcome::Displayed(text) => {
                info!("Displayed {} characters", text.chars().count())
            }
            PipelineOutcome::Cancelled(stage) => info!("Attempt cancelled during {:?}", stage),
            PipelineOutcome::Failed(e) => {
                warn!("Attempt failed: {}", e);
                self.display.notify(Notice::error(e.to_string()));
            }
        }

        self.advance(PipelineState::Idle);
        outcome
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal pipeline transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
        self.trace.push(next);
    }

    /// A previous attempt's future may have been dropped mid-stage
    fn reset_if_interrupted(&mut self) {
        if self.state != PipelineState::Idle {
            warn!("Previous attempt was interrupted in {:?}", self.state);
            self.state = PipelineState::Idle;
        }
    }
}

/// Race a stage against cancellation; `None` means the user cancelled
///
/// Cancellation is checked first, so a stage is never polled once its
/// attempt has been cancelled.
async fn run_stage<F: Future>(cancel: &CancellationToken, stage: F) -> Option<F::Output> {
    let token = cancel.child_token();
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = stage => Some(output),
    }
}
