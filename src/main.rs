//! SnapScan - photograph a document, crop it, and read its text
//!
//! Runs the capture, crop and recognize pipeline from the command line with
//! desktop stand-ins for the camera, crop window and OCR engine.

mod app;
mod capture;
mod config;
mod crop;
mod permission;
mod pipeline;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::{SessionOptions, SnapScanApp};
use crate::capture::CameraSignal;
use crate::config::AppConfig;
use crate::crop::{CropEdits, CropRegion, Rotation};
use crate::permission::ConsentPolicy;
use crate::pipeline::{ConsoleDisplay, DisplaySurface, Notice, PipelineOutcome};
use crate::vision::TextFilter;

/// SnapScan - capture, crop and recognize document text
#[derive(Parser, Debug)]
#[command(name = "snapscan")]
#[command(about = "Photograph a document, crop it, and extract its text")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take a photo, crop it, and print the recognized text
    Capture {
        /// Photo to import as the camera shot (omit to cancel the capture)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Answer the camera permission prompt with yes
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        crop: CropArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Finish a capture that was interrupted before it completed
    Resume {
        /// Photo the camera wrote after the interruption
        #[arg(short, long, conflicts_with = "cancelled")]
        source: Option<PathBuf>,

        /// Report the interrupted capture as cancelled
        #[arg(long)]
        cancelled: bool,

        #[command(flatten)]
        crop: CropArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show the pending capture, if any
    Status,
}

#[derive(ClapArgs, Debug)]
struct CropArgs {
    /// Selection as normalized x,y,width,height (default: whole image)
    #[arg(long)]
    region: Option<CropRegion>,

    /// Clockwise rotation in degrees (multiple of 90)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    rotate: i32,

    #[arg(long)]
    flip_horizontal: bool,

    #[arg(long)]
    flip_vertical: bool,

    /// Back out at the crop step, as if the crop window were closed
    #[arg(long)]
    discard_crop: bool,
}

impl CropArgs {
    fn edits(&self) -> Result<CropEdits> {
        Ok(CropEdits {
            region: self.region.unwrap_or_default(),
            rotation: Rotation::from_degrees(self.rotate).map_err(anyhow::Error::msg)?,
            flip_horizontal: self.flip_horizontal,
            flip_vertical: self.flip_vertical,
            discard: self.discard_crop,
        })
    }
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    /// Keep only digits in the recognized text
    #[arg(long, conflicts_with = "verbatim")]
    digits_only: bool,

    /// Print the recognized text unchanged
    #[arg(long)]
    verbatim: bool,
}

impl FilterArgs {
    fn text_filter(&self) -> Option<TextFilter> {
        match (self.digits_only, self.verbatim) {
            (true, _) => Some(TextFilter::DigitsOnly),
            (_, true) => Some(TextFilter::Verbatim),
            _ => None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only recognized text
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_or_create_config(args.config.as_deref())?;

    match args.command {
        Command::Capture { source, yes, crop, filter } => {
            let options = SessionOptions {
                source,
                edits: crop.edits()?,
                text_filter: filter.text_filter(),
                consent: yes.then_some(ConsentPolicy::Allow),
            };
            let mut app = SnapScanApp::new(&config, options)?;

            let cancel = cancel_on_ctrl_c();
            let outcome = app.capture(&cancel).await;
            Ok(exit_code(&outcome))
        }
        Command::Resume { source, cancelled, crop, filter } => {
            let options = SessionOptions {
                source: None,
                edits: crop.edits()?,
                text_filter: filter.text_filter(),
                consent: None,
            };
            let mut app = SnapScanApp::new(&config, options)?;

            let signal = if cancelled {
                CameraSignal::Cancelled
            } else {
                CameraSignal::Completed
            };

            let cancel = cancel_on_ctrl_c();
            match app.resume(signal, source, &cancel).await? {
                Some(outcome) => Ok(exit_code(&outcome)),
                None => {
                    ConsoleDisplay.notify(Notice::info("No capture is pending"));
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Status => {
            let app = SnapScanApp::new(&config, SessionOptions::default())?;
            match app.pending_ticket()? {
                Some(ticket) => println!(
                    "Pending capture {} started at {} -> {}",
                    ticket.ticket_id,
                    ticket.created_at,
                    ticket.reference.uri()
                ),
                None => println!("No capture is pending"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the explicit config file, or the platform one (created on first run)
fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return config::load_config(path);
    }

    let config_path = storage::get_config_dir()
        .context("Could not locate the configuration directory")?
        .join("config.toml");
    config::load_or_create_config(&config_path)
}

/// Cancel the running attempt when the user presses Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn exit_code(outcome: &PipelineOutcome) -> ExitCode {
    match outcome {
        PipelineOutcome::Failed(_) => ExitCode::FAILURE,
        PipelineOutcome::Displayed(_) | PipelineOutcome::Cancelled(_) => ExitCode::SUCCESS,
    }
}
