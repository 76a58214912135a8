use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Shared module proxy.
    Proxy,
    /// Version-control archive at an exact, immutable commit.
    VcsPinnedCommit,
    /// Version-control archive by tag, branch or abbreviated commit.
    VcsArchive,
    /// Path-based module registry on the module's own host.
    RegistryPath,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::VcsPinnedCommit => "pinned-commit",
            Self::VcsArchive => "vcs-archive",
            Self::RegistryPath => "registry-path",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// One URL to try, and whose credentials apply if the module is private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    pub kind:          StrategyKind,
    pub url:           String,
    pub auth_host:     String,
    pub pinned_commit: Option<String>,
}

impl SourceCandidate {
    pub fn new(kind: StrategyKind, url: impl Into<String>, auth_host: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            auth_host: auth_host.into(),
            pinned_commit: None,
        }
    }

    pub fn pinned(mut self, commit: impl Into<String>) -> Self {
        self.pinned_commit = Some(commit.into());
        self
    }
}
