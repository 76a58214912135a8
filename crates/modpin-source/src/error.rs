use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid package reference '{input}': expected path@version")]
    InvalidPackageRef { input: String },

    #[error("invalid module path in '{package}': {reason}")]
    InvalidPath { package: String, reason: &'static str },

    #[error("no viable download source for '{package}': {reason}")]
    NoViableSource { package: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Why an origin provider had no answer. Never fatal to resolution.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to run '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("'{program}' exited with {status}: {stderr}")]
    Exit {
        program: String,
        status:  String,
        stderr:  String,
    },

    #[error("invalid module metadata: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no answer within {after:?}")]
    Timeout { after: std::time::Duration },

    #[error("metadata request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),
}
