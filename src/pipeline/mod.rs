//! Capture-crop-recognize pipeline
//!
//! The controller wires the stage sessions together and projects results to
//! a display surface. Errors are defined here because every stage reports
//! into the same taxonomy.

pub mod controller;
pub mod display;
pub mod error;

#[cfg(test)]
pub mod testing;

pub use controller::{Collaborators, PipelineController, PipelineOutcome};
pub use display::{ConsoleDisplay, DisplaySurface, Notice};
pub use error::{PipelineError, StorageError};
