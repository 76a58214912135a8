use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to read credential file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("credential file '{path}' is not valid UTF-8")]
    Encoding { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, AuthError>;
