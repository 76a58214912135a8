use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("archive contains no files")]
    Empty,

    #[error("zip-slip attack detected: entry '{entry}' escapes the destination")]
    ZipSlip { entry: String },

    #[error("symlink '{entry}' points outside the destination: {target}")]
    SymlinkEscape { entry: String, target: String },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
}

impl ArchiveError {
    pub(crate) fn corrupted(err: zip::result::ZipError) -> Self {
        Self::Corrupted { reason: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
