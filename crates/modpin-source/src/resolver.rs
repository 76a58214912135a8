use std::time::Duration;

use modpin_version::is_full_commit;
use tracing::debug;

use crate::escape::{escape_path, escape_version};
use crate::{Origin, OriginChain, PackageRef, Result, SourceCandidate, StrategyKind};

pub const DEFAULT_VCS_HOST: &str = "github.com";

/// Path infix that identifies a generated-code schema registry.
pub const SCHEMA_REGISTRY_INFIX: &str = "/gen/go/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// In the order they should be tried.
    pub candidates: Vec<SourceCandidate>,
    pub origin:     Option<Origin>,
}

impl Resolution {
    /// Full commit hash the origin pins, if any.
    pub fn pinned_revision(&self) -> Option<&str> {
        self.origin.as_ref().and_then(Origin::commit).filter(|h| is_full_commit(h))
    }
}

/// Turns a module identity into ordered download candidates.
pub struct SourceResolver {
    proxy:    Option<String>,
    vcs_host: String,
    origins:  OriginChain,
}

impl SourceResolver {
    pub fn new(proxy: Option<String>, origins: OriginChain) -> Self {
        Self {
            proxy: proxy.map(|p| p.trim_end_matches('/').to_string()).filter(|p| !p.is_empty()),
            vcs_host: DEFAULT_VCS_HOST.to_string(),
            origins,
        }
    }

    pub fn with_vcs_host(mut self, host: impl Into<String>) -> Self {
        self.vcs_host = host.into();
        self
    }

    /// Bound each origin lookup (proxy metadata, tool run) to `timeout`.
    pub fn set_lookup_timeout(&mut self, timeout: Option<Duration>) { self.origins.set_timeout(timeout); }

    pub fn proxy(&self) -> Option<&str> { self.proxy.as_deref() }

    pub fn vcs_host(&self) -> &str { &self.vcs_host }

    pub async fn resolve(&self, package: &PackageRef, private: bool) -> Result<Resolution> {
        package.validate()?;
        let host = package.host();

        let mut resolution = Resolution::default();

        if let (Some(proxy), false) = (&self.proxy, private) {
            resolution.candidates.push(SourceCandidate::new(
                StrategyKind::Proxy,
                proxy_url(proxy, package, "zip"),
                host,
            ));
        }

        if host == self.vcs_host {
            let origin = self.origins.resolve(package, private).await;
            let vcs = origin.as_ref().map(|o| self.vcs_candidates(o, host)).unwrap_or_default();

            if vcs.is_empty() {
                debug!(%package, "no usable origin, falling back to tag archive");
                resolution.candidates.push(self.tag_fallback(package));
            } else {
                resolution.candidates.extend(vcs);
            }
            resolution.origin = origin;
        } else {
            resolution.candidates.push(registry_candidate(package));
        }

        Ok(resolution)
    }

    /// Candidates derived from version-control metadata.
    fn vcs_candidates(&self, origin: &Origin, auth_host: &str) -> Vec<SourceCandidate> {
        let prefix = format!("https://{}/", self.vcs_host);
        if origin.vcs != "git" || !origin.url.starts_with(&prefix) {
            return Vec::new();
        }
        let repo = origin.url.trim_start_matches(prefix.as_str());
        let repo = repo.strip_suffix(".git").unwrap_or(repo).trim_end_matches('/');
        let base = format!("{prefix}{repo}/archive");

        let mut out = Vec::new();
        let commit = origin.commit();

        if let Some(hash) = commit.filter(|h| is_full_commit(h)) {
            out.push(
                SourceCandidate::new(StrategyKind::VcsPinnedCommit, format!("{base}/{hash}.zip"), auth_host)
                    .pinned(hash),
            );
        }

        let reference = origin.reference();
        let archive_url = if let Some(tag) = reference.and_then(|r| r.strip_prefix("refs/tags/")) {
            Some(format!("{base}/refs/tags/{}.zip", escape_version(tag)))
        } else if let Some(branch) = reference.and_then(|r| r.strip_prefix("refs/heads/")) {
            Some(format!("{base}/refs/heads/{}.zip", escape_version(branch)))
        } else {
            commit.map(|hash| format!("{base}/{hash}.zip"))
        };

        if let Some(url) = archive_url {
            if out.iter().all(|c| c.url != url) {
                out.push(SourceCandidate::new(StrategyKind::VcsArchive, url, auth_host));
            }
        }
        out
    }

    fn tag_fallback(&self, package: &PackageRef) -> SourceCandidate {
        let mut segments = package.segments();
        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => SourceCandidate::new(
                StrategyKind::VcsArchive,
                format!(
                    "https://{}/{owner}/{repo}/archive/refs/tags/{}.zip",
                    self.vcs_host,
                    escape_version(package.version())
                ),
                package.host(),
            ),
            _ => registry_candidate(package),
        }
    }
}

/// `{proxy}/{escaped path}/@v/{escaped version}.{ext}`
pub(crate) fn proxy_url(proxy: &str, package: &PackageRef, ext: &str) -> String {
    format!(
        "{proxy}/{}/@v/{}.{ext}",
        escape_path(package.path()),
        escape_version(package.version())
    )
}

fn registry_candidate(package: &PackageRef) -> SourceCandidate {
    let host = package.host();
    let path = escape_path(package.path());
    let version = escape_version(package.version());
    let url = if package.path().contains(SCHEMA_REGISTRY_INFIX) {
        format!("https://{host}{SCHEMA_REGISTRY_INFIX}{path}/@v/{version}.zip")
    } else {
        format!("https://{host}/{path}/@v/{version}.zip")
    };
    SourceCandidate::new(StrategyKind::RegistryPath, url, host)
}
