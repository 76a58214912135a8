use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use modpin_version::{VersionClass, classify};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::{PackageRef, ProviderError};

/// Version-control provenance of a module release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Origin {
    #[serde(rename = "VCS", default)]
    pub vcs:    String,
    #[serde(rename = "URL", default)]
    pub url:    String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref:  Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash:   Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
}

impl Origin {
    pub fn git(url: impl Into<String>) -> Self {
        Self { vcs: "git".into(), url: url.into(), ..Self::default() }
    }

    pub fn with_ref(mut self, r: impl Into<String>) -> Self {
        self.r#ref = Some(r.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn reference(&self) -> Option<&str> { self.r#ref.as_deref().filter(|r| !r.is_empty()) }

    pub fn commit(&self) -> Option<&str> { self.hash.as_deref().filter(|h| !h.is_empty()) }
}

/// Module metadata as served by a proxy `.info` endpoint or `go list -m -json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub time:    Option<String>,
    #[serde(default)]
    pub origin:  Option<Origin>,
}

/// One source of [`Origin`] metadata.
#[async_trait]
pub trait OriginProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this provider may be consulted about private modules.
    fn serves_private(&self) -> bool { true }

    async fn origin(&self, package: &PackageRef) -> Result<Option<Origin>, ProviderError>;
}

/// Ordered providers; the first `Some` wins and failures fall through.
///
/// With a timeout set, each provider gets that long to answer; one that
/// takes longer counts as a failure.
#[derive(Default)]
pub struct OriginChain {
    providers: Vec<Box<dyn OriginProvider>>,
    timeout:   Option<Duration>,
}

impl OriginChain {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, provider: impl OriginProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn push(&mut self, provider: Box<dyn OriginProvider>) { self.providers.push(provider); }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) { self.timeout = timeout; }

    pub fn timeout(&self) -> Option<Duration> { self.timeout }

    pub fn len(&self) -> usize { self.providers.len() }

    pub fn is_empty(&self) -> bool { self.providers.is_empty() }

    pub async fn resolve(&self, package: &PackageRef, private: bool) -> Option<Origin> {
        for provider in &self.providers {
            if private && !provider.serves_private() {
                continue;
            }
            let lookup = provider.origin(package);
            let answer = match self.timeout {
                Some(after) => tokio::time::timeout(after, lookup)
                    .await
                    .unwrap_or(Err(ProviderError::Timeout { after })),
                None => lookup.await,
            };
            match answer {
                Ok(Some(origin)) => {
                    debug!(provider = provider.name(), %package, "origin found");
                    return Some(origin);
                }
                Ok(None) => debug!(provider = provider.name(), %package, "no origin"),
                Err(e) => debug!(provider = provider.name(), %package, error = %e, "origin lookup failed"),
            }
        }
        None
    }
}

/// Asks the module toolchain (`go list -m -json path@version`). Runs with the
/// caller's own credentials, so it also answers for private modules.
#[derive(Debug, Clone)]
pub struct ToolLookup {
    program: String,
}

impl Default for ToolLookup {
    fn default() -> Self { Self::new("go") }
}

impl ToolLookup {
    pub fn new(program: impl Into<String>) -> Self { Self { program: program.into() } }
}

#[async_trait]
impl OriginProvider for ToolLookup {
    fn name(&self) -> &'static str { "tool-lookup" }

    async fn origin(&self, package: &PackageRef) -> Result<Option<Origin>, ProviderError> {
        debug!("Executing: {} list -m -json {}", self.program, package);

        let output = Command::new(&self.program)
            .args(["list", "-m", "-json", &package.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProviderError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(ProviderError::Exit {
                program: self.program.clone(),
                status:  output.status.to_string(),
                stderr:  String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info: ModuleInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info.origin)
    }
}

/// Derives an origin from the version string alone, for modules hosted on a
/// known version-control provider.
#[derive(Debug, Clone)]
pub struct VersionInference {
    host: String,
}

impl Default for VersionInference {
    fn default() -> Self { Self::new(crate::DEFAULT_VCS_HOST) }
}

impl VersionInference {
    pub fn new(host: impl Into<String>) -> Self { Self { host: host.into() } }

    pub fn infer(&self, package: &PackageRef) -> Option<Origin> {
        if package.host() != self.host {
            return None;
        }
        let mut segments = package.segments();
        let (owner, repo) = (segments.next()?, segments.next()?);
        if owner.is_empty() || repo.is_empty() {
            return None;
        }

        let origin = Origin::git(format!("https://{}/{owner}/{repo}", self.host));
        Some(match classify(package.version()) {
            VersionClass::Snapshot { commit_prefix, .. } if !commit_prefix.is_empty() => {
                origin.with_hash(commit_prefix)
            }
            VersionClass::Snapshot { .. } => origin,
            class @ VersionClass::Tagged(_) => match class.tag_ref() {
                Some(tag_ref) => origin.with_ref(tag_ref),
                None => origin,
            },
        })
    }
}

#[async_trait]
impl OriginProvider for VersionInference {
    fn name(&self) -> &'static str { "version-inference" }

    async fn origin(&self, package: &PackageRef) -> Result<Option<Origin>, ProviderError> {
        Ok(self.infer(package))
    }
}
