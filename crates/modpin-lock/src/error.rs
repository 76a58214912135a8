use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("failed to read lock file '{path}': {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid lock file '{path}': {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("unsupported lock file schema {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("invalid lock file: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("module {module} has an invalid hash: {source}")]
    InvalidHash {
        module: String,
        source: modpin_verify::VerifyError,
    },

    #[error("failed to serialize lock file: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Write(#[from] modpin_fs::Error),

    #[error("requirements line {line}: {message}")]
    Requirements { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, LockError>;
