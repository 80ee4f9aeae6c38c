//! Image references passed between pipeline stages

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::pipeline::StorageError;
use crate::storage::photos::DestinationHandle;

/// Opaque, read-only handle to pixel data written by an external facility
///
/// A crop produces a new reference rather than mutating the one it was given,
/// so identity is carried by `id`, not by the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    id: Uuid,
    path: PathBuf,
    /// SHA-256 of the file contents, recorded when the producer finished writing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
}

impl ImageReference {
    /// Wrap a file produced by a facility under a fresh identity
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            fingerprint: None,
        }
    }

    /// The reference a capture into `destination` will resolve to
    pub fn for_destination(destination: &DestinationHandle) -> Self {
        Self {
            id: destination.id(),
            path: destination.path().to_path_buf(),
            fingerprint: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Stable external form handed to facilities
    pub fn uri(&self) -> String {
        format!("file://{}", self.path.display())
    }

    /// Record the digest of the bytes currently behind this reference
    pub fn fingerprinted(mut self) -> Result<Self, StorageError> {
        self.fingerprint = Some(digest_file(&self.path)?);
        Ok(self)
    }

    /// Check that the bytes still match the recorded digest
    ///
    /// References without a fingerprint always verify.
    pub fn verify(&self) -> Result<bool, StorageError> {
        match &self.fingerprint {
            Some(expected) => Ok(&digest_file(&self.path)? == expected),
            None => Ok(true),
        }
    }
}

fn digest_file(path: &Path) -> Result<String, StorageError> {
    let bytes = std::fs::read(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
