//! Pipeline error taxonomy
//!
//! Every variant is surfaced once to the user as a transient notice and ends
//! the attempt. Cancellations are not errors and never appear here.

use std::path::PathBuf;
use thiserror::Error;

/// Failure that halts one pipeline attempt
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The user refused camera access
    #[error("Camera permission denied")]
    PermissionDenied,

    /// The capture destination could not be prepared
    #[error("Could not create the photo file: {0}")]
    Storage(#[from] StorageError),

    /// The camera facility could not be launched or reported an error
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// The crop facility could not produce a cropped image
    #[error("Crop failed: {0}")]
    CropFailed(String),

    /// Decoding or text recognition failed
    #[error("Could not recognize text: {0}")]
    RecognitionFailed(String),
}

/// Filesystem failures owned by the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage directory {path:?} is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pending capture ticket at {path:?}: {reason}")]
    Ticket { path: PathBuf, reason: String },
}
