//! Visitenkarte
//!
//! Business-card generator: turns a contact record into a vCard payload and
//! printable card faces, and delivers them as a PDF or as a ZIP of PDFs.
//!
//! # Features
//!
//! - **vCard 3.0** payload for the QR code on the back of the card
//! - **Pluggable rendering**: faces are rasterized through the [`Rasterizer`]
//!   trait; a pure-Rust software rasterizer is built in
//! - **Two delivery modes**: one two-page PDF, or two single-page PDFs in a ZIP
//!
//! # Example
//!
//! ```no_run
//! use visitenkarte::{CardSession, ContactRecord, DirectoryTarget, ExportConfig};
//!
//! # async fn run() -> visitenkarte::Result<()> {
//! let mut record = ContactRecord::new();
//! record.first_name = "Anna".into();
//! record.last_name = "Muster".into();
//! record.select_location("Brunswiek");
//!
//! let pipeline = visitenkarte::new_pipeline(ExportConfig::default())?;
//! let mut session = CardSession::new(record);
//! let path = pipeline
//!     .export_and_save(&mut session, &DirectoryTarget::new("."))
//!     .await?;
//! println!("saved {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assembler;
pub mod config;
pub mod contact;
pub mod pipeline;
pub mod rendering;
pub mod save;
pub mod session;
pub mod vcard;

pub use assembler::{Artifact, ArtifactKind, CapturedFace, DocumentAssembler, CARD_PAGE};
pub use config::{ExportConfig, ExportMode};
pub use contact::{ContactRecord, Location, POSITIONS};
pub use pipeline::{CancelToken, ExportPipeline};
pub use rendering::{Bitmap, CardTemplate, Face, Rasterizer, RenderOptions, SoftwareRasterizer};
pub use save::{DirectoryTarget, SaveTarget};
pub use session::CardSession;

/// Create an export pipeline with the built-in rasterizer and PDF/ZIP writers.
pub fn new_pipeline(config: ExportConfig) -> Result<ExportPipeline> {
    ExportPipeline::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pipeline_uses_config() {
        let config = ExportConfig {
            mode: ExportMode::ZipArchive,
            ..Default::default()
        };
        let pipeline = new_pipeline(config).unwrap();
        assert_eq!(pipeline.config().mode, ExportMode::ZipArchive);
    }

    #[test]
    fn test_card_page() {
        assert_eq!(CARD_PAGE.width_mm, 85.0);
        assert_eq!(CARD_PAGE.height_mm, 55.0);
        assert!(CARD_PAGE.width_mm > CARD_PAGE.height_mm);
    }
}
