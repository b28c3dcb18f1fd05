//! Export configuration

use crate::rendering::layout::CardTemplate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for the settle delay; longer values are clamped.
pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// How the captured faces are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    /// One PDF with a page per face
    #[default]
    SinglePdf,
    /// One single-page PDF per face, packed into a ZIP
    ZipArchive,
}

impl ExportMode {
    /// Suggested file name for the delivered artifact
    pub fn file_name(self) -> &'static str {
        match self {
            ExportMode::SinglePdf => "visitenkarte.pdf",
            ExportMode::ZipArchive => "visitenkarten.zip",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::SinglePdf => f.write_str("single-pdf"),
            ExportMode::ZipArchive => f.write_str("zip-archive"),
        }
    }
}

/// Configuration for an export run
///
/// The defaults reproduce the printed card: front captured at 5x with a
/// transparent background, back at 3x on white, half a second of settle time
/// after revealing the back face.
///
/// # Examples
///
/// ```
/// let cfg = visitenkarte::ExportConfig::default();
/// assert_eq!(cfg.mode.file_name(), "visitenkarte.pdf");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub mode: ExportMode,
    pub template: CardTemplate,
    /// Device pixels per layout pixel for the front face
    pub front_scale: f32,
    /// Device pixels per layout pixel for the back face
    pub back_scale: f32,
    /// Wait after revealing a hidden face before capturing it
    pub settle_delay_ms: u64,
    /// Edge length of the QR code in layout pixels
    pub qr_size_px: u32,
    /// PNG logo placed on the front face (classic template)
    pub logo_path: Option<PathBuf>,
    /// Prefix for archive entry names (`<label>-vorne.pdf`)
    pub archive_label: String,
    /// Retry a capture once when an asset failed to load
    pub retry_render: bool,
    /// Directory the artifact is written to
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::default(),
            template: CardTemplate::default(),
            front_scale: 5.0,
            back_scale: 3.0,
            settle_delay_ms: 500,
            qr_size_px: 100,
            logo_path: None,
            archive_label: "visitenkarte".to_string(),
            retry_render: true,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a JSON file; missing keys take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg: ExportConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [("front_scale", self.front_scale), ("back_scale", self.back_scale)] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, scale)));
            }
        }
        if self.qr_size_px == 0 {
            return Err(Error::Config("qr_size_px must be positive".into()));
        }
        let label = self.archive_label.trim();
        if label.is_empty() || label.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "archive_label '{}' is not a usable file name prefix",
                self.archive_label
            )));
        }
        Ok(())
    }

    /// Settle delay, clamped to [`MAX_SETTLE_DELAY`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms).min(MAX_SETTLE_DELAY)
    }
}
