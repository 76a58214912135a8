use modpin_fetch::FetchError;
use modpin_lock::LockError;
use modpin_source::ResolveError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    InvalidModule(#[from] ResolveError),

    #[error("{failed} of {total} modules could not be fetched")]
    FetchFailed { failed: usize, total: usize },

    #[error("lock file is out of sync with the module list")]
    OutOfSync,

    #[error("module {path} is not in the module list")]
    UnknownModule { path: String },

    #[error("failed to read {what}: {source}")]
    Io { what: &'static str, source: std::io::Error },
}

impl CliError {
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Fetch(e) => e.hint(),
            Self::Lock(LockError::Read { .. }) => Some("Run `modpin lock` to create the lock file.".into()),
            Self::InvalidModule(_) => Some("Modules are written as path@version, e.g. golang.org/x/text@v0.14.0".into()),
            Self::OutOfSync => Some("Run `modpin update` to refresh the lock file.".into()),
            Self::UnknownModule { .. } => Some("Add the module to the module list first.".into()),
            _ => None,
        }
    }
}
