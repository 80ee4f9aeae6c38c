//! Pending capture ticket persistence
//!
//! A ticket records where an in-flight capture is writing and which image
//! reference it will resolve to. It lives in a single JSON file, so saving a
//! new ticket invalidates any previous one.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::capture::ImageReference;
use crate::pipeline::StorageError;
use crate::storage::photos::DestinationHandle;

/// Persisted record of an in-flight capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCaptureTicket {
    pub ticket_id: Uuid,
    pub destination: PathBuf,
    pub reference: ImageReference,
    /// Unix timestamp (seconds) when the capture was started
    pub created_at: i64,
}

impl PendingCaptureTicket {
    pub fn new(destination: &DestinationHandle) -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            destination: destination.path().to_path_buf(),
            reference: ImageReference::for_destination(destination),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// File-backed slot holding at most one pending ticket
#[derive(Debug, Clone)]
pub struct TicketStore {
    path: PathBuf,
}

impl TicketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `ticket`, replacing whatever was pending before
    pub fn save(&self, ticket: &PendingCaptureTicket) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let content = serde_json::to_string_pretty(ticket).map_err(|e| self.error(e))?;

        // Write then rename so a teardown mid-write never leaves half a ticket
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, content).map_err(|e| self.error(e))?;
        std::fs::rename(&staging, &self.path).map_err(|e| self.error(e))?;

        debug!("Saved pending capture ticket {}", ticket.ticket_id);
        Ok(())
    }

    /// Load the pending ticket, if any
    ///
    /// An unreadable or corrupt ticket is discarded and reported as absent.
    pub fn load(&self) -> Result<Option<PendingCaptureTicket>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.error(e)),
        };

        match serde_json::from_str(&content) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(e) => {
                warn!("Discarding corrupt capture ticket {:?}: {}", self.path, e);
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Remove the pending ticket; a missing ticket is not an error
    pub fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, reason: impl std::fmt::Display) -> StorageError {
        StorageError::Ticket {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
