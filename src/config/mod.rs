//! Application Configuration
//!
//! User settings stored in TOML format. Every section has defaults, so a
//! partial file (or none at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::crop::CropOptions;
use crate::permission::ConsentPolicy;
use crate::storage::RetentionPolicy;
use crate::vision::TextFilter;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capture file settings
    pub storage: StorageSettings,
    /// Permission settings
    pub permission: PermissionSettings,
    /// Crop window settings
    pub crop: CropOptions,
    /// Text recognition settings
    pub recognition: RecognitionSettings,
}

/// Where captures live and how long they are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Override for the capture directory
    pub photo_dir: Option<PathBuf>,
    /// Capture retention policy
    pub retention: RetentionPolicy,
}

/// How camera access requests are answered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSettings {
    pub camera: ConsentPolicy,
}

/// Text recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Post-processing of recognized text
    pub text_filter: TextFilter,
    /// Tesseract language code (e.g., "eng")
    pub language: String,
    /// Path or name of the tesseract executable
    pub tesseract_path: PathBuf,
    /// Image preprocessing before OCR
    pub preprocessing: OcrPreprocessing,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            text_filter: TextFilter::DigitsOnly,
            language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            preprocessing: OcrPreprocessing::default(),
        }
    }
}

/// Image enhancements applied before OCR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrPreprocessing {
    /// Master switch for all filters below
    pub enabled: bool,
    pub grayscale: bool,
    /// Contrast factor (1.0 = unchanged)
    pub contrast: f32,
    /// Unsharp mask strength (0.0 = off)
    pub sharpen: f32,
    /// Histogram equalization (implies grayscale)
    pub equalize: bool,
    /// Invert colors, for light text on dark backgrounds
    pub invert: bool,
    /// Fixed upscale factor
    pub scale: u32,
    /// Upscale small crops automatically
    pub auto_upscale: bool,
}

impl Default for OcrPreprocessing {
    fn default() -> Self {
        Self {
            enabled: true,
            grayscale: true,
            contrast: 1.0,
            sharpen: 0.0,
            equalize: false,
            invert: false,
            scale: 1,
            auto_upscale: true,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file, creating its directory
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write config {:?}", path))?;
    Ok(())
}

/// Load the config at `path`, writing the defaults there if it is missing
///
/// Failing to write the defaults is not fatal.
pub fn load_or_create_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let config = load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    let config = AppConfig::default();
    match save_config(&config, path) {
        Ok(()) => info!("Wrote default configuration to {:?}", path),
        Err(e) => warn!("Using default configuration: {:#}", e),
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropShape;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Storage defaults
        assert!(config.storage.photo_dir.is_none());
        assert_eq!(config.storage.retention, RetentionPolicy::Keep);

        // Permission defaults
        assert_eq!(config.permission.camera, ConsentPolicy::Ask);

        // Crop defaults
        assert_eq!(config.crop.shape, CropShape::Rectangle);
        assert!(!config.crop.fixed_aspect_ratio);

        // Recognition defaults
        assert_eq!(config.recognition.text_filter, TextFilter::DigitsOnly);
        assert_eq!(config.recognition.language, "eng");
        assert!(config.recognition.preprocessing.enabled);
        assert!(config.recognition.preprocessing.auto_upscale);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.storage.retention = RetentionPolicy::DeleteOnSuccess;
        config.recognition.text_filter = TextFilter::Verbatim;
        config.crop.shape = CropShape::Oval;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.storage.retention, RetentionPolicy::DeleteOnSuccess);
        assert_eq!(parsed.recognition.text_filter, TextFilter::Verbatim);
        assert_eq!(parsed.crop, config.crop);
        assert_eq!(parsed.recognition.preprocessing, config.recognition.preprocessing);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [recognition]
            text_filter = "verbatim"

            [storage]
            retention = "delete_on_next_allocate"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.recognition.text_filter, TextFilter::Verbatim);
        assert_eq!(parsed.recognition.language, "eng");
        assert_eq!(parsed.storage.retention, RetentionPolicy::DeleteOnNextAllocate);
        assert_eq!(parsed.permission.camera, ConsentPolicy::Ask);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.storage.photo_dir = Some(PathBuf::from("/tmp/snapscan-photos"));
        config.permission.camera = ConsentPolicy::Allow;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.storage.photo_dir, config.storage.photo_dir);
        assert_eq!(loaded.permission.camera, ConsentPolicy::Allow);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str(
            r#"
            [recognition]
            text_filter = "letters_only"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = load_or_create_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.recognition.text_filter, TextFilter::DigitsOnly);

        // Edits made to the written file are picked up next time
        let mut edited = load_config(&path).unwrap();
        edited.storage.retention = RetentionPolicy::DeleteOnSuccess;
        save_config(&edited, &path).unwrap();

        let reloaded = load_or_create_config(&path).unwrap();
        assert_eq!(reloaded.storage.retention, RetentionPolicy::DeleteOnSuccess);
    }
}
