//! Storage Layer
//!
//! Owns the on-disk artifacts of the pipeline: capture files, crop output,
//! and the pending capture ticket.

pub mod photos;
pub mod tickets;

pub use photos::{DestinationHandle, PhotoStore, RetentionPolicy};
pub use tickets::{PendingCaptureTicket, TicketStore};

use anyhow::Result;
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "snapscan", "SnapScan")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Get the cache directory used for crop output
pub fn get_cache_dir() -> Result<PathBuf> {
    let cache_dir = project_dirs()?.cache_dir().to_path_buf();
    std::fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

/// Default location of capture files
pub fn default_photo_dir() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("Pictures"))
}

/// Location of the pending capture ticket
pub fn ticket_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("pending_capture.json"))
}
