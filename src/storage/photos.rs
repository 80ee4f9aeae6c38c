//! Capture destination allocation
//!
//! The photo store is the only component that creates capture files. Names
//! are derived from the local time plus a sequence number so that two
//! allocations within the same second never collide.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::pipeline::StorageError;
use crate::storage::TicketStore;

/// What happens to capture files once they are no longer needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Captures accumulate until removed by hand
    #[default]
    Keep,
    /// Each allocation removes earlier capture files in the directory,
    /// except the one a pending capture is still writing to
    DeleteOnNextAllocate,
    /// The raw capture is removed after its text has been displayed
    DeleteOnSuccess,
}

/// A freshly created, empty file the camera may write into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationHandle {
    id: Uuid,
    path: PathBuf,
}

impl DestinationHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Allocates uniquely named capture files in one directory
pub struct PhotoStore {
    dir: PathBuf,
    retention: RetentionPolicy,
    /// Consulted before sweeping so a pending capture keeps its file
    tickets: Option<TicketStore>,
    sequence: Mutex<u32>,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>, retention: RetentionPolicy) -> Self {
        Self {
            dir: dir.into(),
            retention,
            tickets: None,
            sequence: Mutex::new(0),
        }
    }

    /// Protect the destination of whatever capture `tickets` has pending
    pub fn with_tickets(mut self, tickets: TicketStore) -> Self {
        self.tickets = Some(tickets);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Create a new empty capture file and return its handle
    pub fn allocate(&self) -> Result<DestinationHandle, StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Unavailable {
            path: self.dir.clone(),
            source,
        })?;

        if self.retention == RetentionPolicy::DeleteOnNextAllocate {
            self.sweep();
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut sequence = self.sequence.lock();
        loop {
            let path = self.dir.join(format!("JPEG_{}_{}.jpg", timestamp, *sequence));
            *sequence = sequence.wrapping_add(1);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!("Allocated capture destination {:?}", path);
                    return Ok(DestinationHandle {
                        id: Uuid::new_v4(),
                        path,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(StorageError::Create { path, source }),
            }
        }
    }

    /// Delete a capture file once the pipeline is done with it
    ///
    /// Only honored under [`RetentionPolicy::DeleteOnSuccess`], and only for
    /// files inside this store's directory.
    pub fn release(&self, path: &Path) {
        if self.retention != RetentionPolicy::DeleteOnSuccess {
            return;
        }
        if !path.starts_with(&self.dir) {
            warn!("Refusing to release {:?}: outside {:?}", path, self.dir);
            return;
        }
        self.remove(path);
    }

    /// Remove capture files left by earlier allocations, in any process
    fn sweep(&self) {
        let pending = match self.tickets.as_ref().map(TicketStore::load) {
            Some(Ok(ticket)) => ticket.map(|t| t.destination),
            Some(Err(e)) => {
                // Without knowing what is pending, nothing is safe to delete
                warn!("Skipping capture cleanup: {}", e);
                return;
            }
            None => None,
        };

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {:?} for cleanup: {}", self.dir, e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !is_capture_file(&path) || pending.as_deref() == Some(path.as_path()) {
                continue;
            }
            self.remove(&path);
        }
    }

    fn remove(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed capture file {:?}", path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove capture file {:?}: {}", path, e),
        }
    }
}

fn is_capture_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("JPEG_") && name.ends_with(".jpg"))
}
