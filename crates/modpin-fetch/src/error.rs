use std::io;
use std::path::PathBuf;
use std::time::Duration;

use modpin_archive::ArchiveError;
use modpin_auth::AuthError;
use modpin_source::{ResolveError, StrategyKind};
use modpin_verify::VerifyError;

/// Failure of a single download attempt. Always recoverable: the orchestrator
/// moves on to the next candidate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Network {
        url:    String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("failed to write download to '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl TransferError {
    pub fn network(url: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Network { url: url.to_string(), source: source.into() }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("all download sources failed for {package} (last tried {strategy}): {source}")]
    AllSourcesFailed {
        package:  String,
        strategy: StrategyKind,
        private:  bool,
        source:   TransferError,
    },

    #[error("failed to extract {package}: {source}")]
    Archive { package: String, source: ArchiveError },

    #[error("cache error: {0}")]
    Cache(#[from] modpin_fs::Error),

    #[error("cache entry '{path}' was written without holding its lock")]
    CacheConflict { path: PathBuf },

    #[error("failed to evict '{path}': {source}")]
    Evict { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Credentials(#[from] AuthError),

    #[error("invalid configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] TransferError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl From<TransferError> for FetchError {
    fn from(e: TransferError) -> Self { Self::Client(e) }
}

impl FetchError {
    /// Actionable advice for the user, when there is any.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::AllSourcesFailed { private: true, package, .. } => {
                let host = package.split('/').next().unwrap_or_default();
                Some(format!(
                    "{package} is private and was fetched directly. Check that your netrc file has \
                     `machine {host} login <user> password <token>` (or a `default` entry) with read access."
                ))
            }
            Self::AllSourcesFailed { private: false, package, source, .. }
                if matches!(source.status(), Some(401 | 403 | 404 | 410)) =>
            {
                let path = package.rsplit_once('@').map_or(package.as_str(), |(path, _)| path);
                let org = path.rsplit_once('/').map_or(path, |(parent, _)| parent);
                Some(format!(
                    "If {path} is a private module, add it to GOPRIVATE (e.g. GOPRIVATE={org}/*) so it bypasses \
                     the proxy, and configure credentials in ~/.netrc."
                ))
            }
            Self::Credentials(_) => Some("Fix or remove the netrc file, or point NETRC at another one.".into()),
            Self::Config(_) => Some("Check modpin.toml and MODPIN_* environment variables.".into()),
            _ => None,
        }
    }
}
