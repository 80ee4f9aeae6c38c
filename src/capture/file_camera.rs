//! Desktop stand-in for the camera: imports an existing photo

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::{CameraFacility, CameraSignal};
use crate::storage::DestinationHandle;

/// Copies a photo from disk into the capture destination
///
/// Without a source file there is nothing to take, which the pipeline sees
/// as the user backing out of the camera.
pub struct FileCamera {
    source: Option<PathBuf>,
}

impl FileCamera {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CameraFacility for FileCamera {
    async fn capture(&self, destination: &DestinationHandle) -> Result<CameraSignal, String> {
        let Some(source) = &self.source else {
            return Ok(CameraSignal::Cancelled);
        };

        let bytes = tokio::fs::copy(source, destination.path())
            .await
            .map_err(|e| format!("cannot import {}: {}", source.display(), e))?;

        debug!("Imported {} bytes from {:?}", bytes, source);
        Ok(CameraSignal::Completed)
    }
}
