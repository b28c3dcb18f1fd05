//! Where finished artifacts go

use crate::assembler::Artifact;
use crate::Result;
use log::debug;
use std::path::PathBuf;

/// Receives the finished artifact, e.g. by writing it to disk.
pub trait SaveTarget: Send + Sync {
    /// Store `artifact` under its suggested file name and return where it went.
    fn save(&self, artifact: &Artifact) -> Result<PathBuf>;
}

/// Writes artifacts into a directory.
///
/// The bytes go to a temporary sibling first and are renamed into place, so a
/// failed write never leaves a truncated file under the final name.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.file_name);
        let tmp = self.dir.join(format!(".{}.part", artifact.file_name));
        debug!("writing {} bytes to {}", artifact.bytes.len(), tmp.display());
        if let Err(err) = std::fs::write(&tmp, &artifact.bytes) {
            std::fs::remove_file(&tmp).ok();
            return Err(err.into());
        }
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }
}
