//! Photo Capture Layer
//!
//! Drives one photograph acquisition: a pending ticket is persisted, the
//! camera facility writes into the allocated destination, and the outcome is
//! resolved against the ticket. Resolution goes through the ticket so that a
//! completion arriving after a process restart still finds its reference.

pub mod file_camera;
pub mod image;

pub use file_camera::FileCamera;
pub use image::ImageReference;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::pipeline::PipelineError;
use crate::storage::{DestinationHandle, PendingCaptureTicket, TicketStore};

/// What the camera reports once it gives control back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSignal {
    /// Pixel data was written to the destination
    Completed,
    /// The user backed out without taking a picture
    Cancelled,
}

/// External camera that writes a photo into a destination file
#[async_trait]
pub trait CameraFacility: Send + Sync {
    /// Returns `Err` when the camera could not be launched at all
    async fn capture(&self, destination: &DestinationHandle) -> Result<CameraSignal, String>;
}

/// Result of a capture stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Completed(ImageReference),
    Cancelled,
}

/// Owns the life cycle of one capture
pub struct CaptureSession {
    camera: Arc<dyn CameraFacility>,
    tickets: TicketStore,
}

impl CaptureSession {
    pub fn new(camera: Arc<dyn CameraFacility>, tickets: TicketStore) -> Self {
        Self { camera, tickets }
    }

    /// The ticket left behind by an interrupted capture, if any
    pub fn pending(&self) -> Result<Option<PendingCaptureTicket>, PipelineError> {
        Ok(self.tickets.load()?)
    }

    /// Capture a photo into `destination`
    pub async fn start(&self, destination: DestinationHandle) -> Result<CaptureOutcome, PipelineError> {
        let ticket = PendingCaptureTicket::new(&destination);
        self.tickets.save(&ticket)?;
        info!("Capturing into {:?}", destination.path());

        let signal = match self.camera.capture(&destination).await {
            Ok(signal) => signal,
            Err(reason) => {
                self.tickets.clear()?;
                return Err(PipelineError::CaptureFailed(reason));
            }
        };

        self.resolve(ticket, signal)
    }

    /// Resolve a camera signal that arrived after the session was torn down
    ///
    /// Returns `None` when no capture is pending; the signal is dropped.
    pub fn resume(&self, signal: CameraSignal) -> Result<Option<CaptureOutcome>, PipelineError> {
        match self.tickets.load()? {
            Some(ticket) => {
                info!("Restored pending capture ticket {}", ticket.ticket_id);
                self.resolve(ticket, signal).map(Some)
            }
            None => {
                warn!("Camera signal {:?} with no pending capture; dropping it", signal);
                Ok(None)
            }
        }
    }

    /// Forget the pending capture after the user cancelled the attempt
    pub fn abandon(&self) -> Result<(), PipelineError> {
        debug!("Abandoning pending capture at {:?}", self.tickets.path());
        Ok(self.tickets.clear()?)
    }

    fn resolve(&self, ticket: PendingCaptureTicket, signal: CameraSignal) -> Result<CaptureOutcome, PipelineError> {
        self.tickets.clear()?;

        match signal {
            CameraSignal::Cancelled => {
                info!("Capture cancelled");
                Ok(CaptureOutcome::Cancelled)
            }
            CameraSignal::Completed => {
                let reference = ticket.reference.fingerprinted()?;
                info!("Capture completed: {}", reference.uri());
                Ok(CaptureOutcome::Completed(reference))
            }
        }
    }
}
