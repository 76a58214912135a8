use std::fmt;

use semver::Version as SemVer;

/// Fixed prefix shared by every commit-snapshot version.
pub const SNAPSHOT_PREFIX: &str = "v0.0.0-";

const INCOMPATIBLE_SUFFIX: &str = "+incompatible";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionClass {
    /// A released tag. The name is the full version string.
    Tagged(String),
    /// An untagged commit encoded as `v0.0.0-<timestamp>-<commit prefix>`.
    Snapshot {
        timestamp:     String,
        commit_prefix: String,
    },
}

/// Classify a version string.
///
/// Anything starting with [`SNAPSHOT_PREFIX`] is a snapshot, whatever else it
/// carries. The commit prefix is the text after the last hyphen.
pub fn classify(version: &str) -> VersionClass {
    let Some(rest) = version.strip_prefix(SNAPSHOT_PREFIX) else {
        return VersionClass::Tagged(version.to_string());
    };

    match rest.rsplit_once('-') {
        Some((timestamp, commit)) => VersionClass::Snapshot {
            timestamp:     timestamp.to_string(),
            commit_prefix: commit.to_string(),
        },
        None => VersionClass::Snapshot {
            timestamp:     String::new(),
            commit_prefix: rest.to_string(),
        },
    }
}

impl VersionClass {
    pub fn is_snapshot(&self) -> bool { matches!(self, Self::Snapshot { .. }) }

    pub fn commit_prefix(&self) -> Option<&str> {
        match self {
            Self::Snapshot { commit_prefix, .. } if !commit_prefix.is_empty() => {
                Some(commit_prefix)
            }
            _ => None,
        }
    }

    /// The git tag ref for a tagged version, e.g. `refs/tags/v1.2.3`.
    pub fn tag_ref(&self) -> Option<String> {
        match self {
            Self::Tagged(name) if !name.is_empty() => Some(format!("refs/tags/{name}")),
            _ => None,
        }
    }

    /// Tag carrying the `+incompatible` marker for pre-module major versions.
    pub fn is_incompatible(&self) -> bool {
        matches!(self, Self::Tagged(name) if name.ends_with(INCOMPATIBLE_SUFFIX))
    }

    pub fn is_prerelease(&self) -> bool {
        self.semver().is_some_and(|v| !v.pre.is_empty())
    }

    /// Semantic version of a tag, without the leading `v` or the
    /// `+incompatible` marker. `None` for snapshots and non-semver tags.
    pub fn semver(&self) -> Option<SemVer> {
        let Self::Tagged(name) = self else {
            return None;
        };
        let bare = name.strip_prefix('v')?;
        let bare = bare.strip_suffix(INCOMPATIBLE_SUFFIX).unwrap_or(bare);
        SemVer::parse(bare).ok()
    }
}

impl fmt::Display for VersionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tagged(name) => write!(f, "tag {name}"),
            Self::Snapshot {
                timestamp,
                commit_prefix,
            } => write!(f, "snapshot {commit_prefix} ({timestamp})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_release() {
        assert_eq!(classify("v1.2.3"), VersionClass::Tagged("v1.2.3".into()));
    }

    #[test]
    fn test_snapshot_split() {
        let class = classify("v0.0.0-20231201120000-abcdef123456");
        assert_eq!(
            class,
            VersionClass::Snapshot {
                timestamp:     "20231201120000".into(),
                commit_prefix: "abcdef123456".into(),
            }
        );
        assert_eq!(class.commit_prefix(), Some("abcdef123456"));
        assert_eq!(class.tag_ref(), None);
    }

    #[test]
    fn test_prefix_wins_over_suffixes() {
        assert!(classify("v0.0.0-rc.1-20231201120000-abc+incompatible").is_snapshot());
        assert!(classify("v0.0.0-abc").is_snapshot());
    }

    #[test]
    fn test_empty_is_tagged() {
        let class = classify("");
        assert_eq!(class, VersionClass::Tagged(String::new()));
        assert_eq!(class.tag_ref(), None);
    }

    #[test]
    fn test_dangling_hyphen_has_no_commit() {
        assert_eq!(classify("v0.0.0-").commit_prefix(), None);
    }

    #[test]
    fn test_incompatible_and_prerelease() {
        let incompatible = classify("v4.1.0+incompatible");
        assert!(incompatible.is_incompatible());
        assert_eq!(incompatible.semver(), Some(SemVer::new(4, 1, 0)));

        assert!(classify("v2.0.0-rc.1").is_prerelease());
        assert!(!classify("v2.0.0").is_prerelease());
        assert!(!classify("release-7").is_prerelease());
    }

    #[test]
    fn test_tag_ref() {
        assert_eq!(
            classify("v1.0.0").tag_ref().as_deref(),
            Some("refs/tags/v1.0.0")
        );
    }
}
