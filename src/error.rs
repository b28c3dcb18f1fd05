//! Error types for the card export pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or exporting a card
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to rasterize a card face
    #[error("Rendering failed: {0}")]
    Render(String),

    /// An asset embedded in a face (e.g. the logo) could not be loaded
    #[error("Failed to load asset: {0}")]
    AssetLoad(String),

    /// PDF assembly failed
    #[error("Document assembly failed: {0}")]
    Document(String),

    /// ZIP packaging failed
    #[error("Archive packaging failed: {0}")]
    Archive(String),

    /// Every face was missing, so there was nothing to put into the document
    #[error("No card face could be rendered; nothing to export")]
    EmptyDocument,

    /// The export was cancelled through its cancel token
    #[error("Export cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error while reading inputs or saving the artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a contact or configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a second rasterization attempt may succeed.
    ///
    /// Only asset loading is treated as transient; layout and encoding
    /// failures are deterministic and would fail again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::AssetLoad(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_asset_errors_are_transient() {
        assert!(Error::AssetLoad("logo.png".into()).is_transient());
        assert!(!Error::Render("bad".into()).is_transient());
        assert!(!Error::EmptyDocument.is_transient());
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().contains("gone"));
    }
}
