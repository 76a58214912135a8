use std::fmt;
use std::str::FromStr;

use crate::escape::escape_path;
use crate::resolver::proxy_url;
use crate::{ResolveError, Result};

/// Identity of one module release: a slash-delimited path whose first segment is
/// the host, plus an exact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRef {
    path:    String,
    version: String,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self { path: path.into(), version: version.into() }
    }

    pub fn path(&self) -> &str { &self.path }

    pub fn version(&self) -> &str { &self.version }

    /// First path segment. Empty for an empty path or a leading `/`.
    pub fn host(&self) -> &str { self.path.split('/').next().unwrap_or_default() }

    /// Path segments after the host.
    pub fn segments(&self) -> impl Iterator<Item = &str> { self.path.split('/').skip(1) }

    /// Cache directory name: `escape(path)@version`.
    pub fn cache_key(&self) -> String { format!("{}@{}", escape_path(&self.path), self.version) }

    /// Check that the reference can safely name a cache directory and URLs.
    ///
    /// The host segment must be present. Path segments must be non-empty and
    /// neither `.` nor `..`. Neither part may hold a backslash or a control
    /// character, and the version may not contain `/`.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() || self.host().is_empty() {
            return Err(ResolveError::NoViableSource {
                package: self.to_string(),
                reason:  "module path has no host segment",
            });
        }

        let reason = if self.path.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
            Some("empty, `.` or `..` path segment")
        } else if self.path.chars().any(|c| c == '\\' || c.is_control()) {
            Some("backslash or control character in path")
        } else if self.version.is_empty() || self.version.chars().any(|c| matches!(c, '/' | '\\') || c.is_control()) {
            Some("version must be a single path segment")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ResolveError::InvalidPath { package: self.to_string(), reason }),
            None => Ok(()),
        }
    }

    /// Proxy metadata URL for this module.
    pub fn info_url(&self, proxy: &str) -> String { proxy_url(proxy.trim_end_matches('/'), self, "info") }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}@{}", self.path, self.version) }
}

impl FromStr for PackageRef {
    type Err = ResolveError;

    /// Split on the last `@`, so paths may themselves contain `@`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().rsplit_once('@') {
            Some((path, version)) if !path.is_empty() && !version.is_empty() => {
                let package = Self::new(path, version);
                package.validate()?;
                Ok(package)
            }
            _ => Err(ResolveError::InvalidPackageRef { input: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let p: PackageRef = "github.com/Org/repo@v1.2.3".parse().unwrap();
        assert_eq!(p.path(), "github.com/Org/repo");
        assert_eq!(p.version(), "v1.2.3");
        assert_eq!(p.host(), "github.com");
        assert_eq!(p.segments().collect::<Vec<_>>(), ["Org", "repo"]);
        assert_eq!(p.to_string(), "github.com/Org/repo@v1.2.3");
        assert_eq!(p.cache_key(), "github.com/!org/repo@v1.2.3");
    }

    #[test]
    fn parse_splits_on_last_at() {
        let p: PackageRef = "host.example/a@b@v1.0.0".parse().unwrap();
        assert_eq!(p.path(), "host.example/a@b");
        assert_eq!(p.version(), "v1.0.0");
    }

    #[test]
    fn parse_rejects_unsafe_segments() {
        for bad in [
            "example.com/../../victim@v1.0.0",
            "example.com/./x@v1.0.0",
            "example.com//x@v1.0.0",
            "example.com/x/@v1.0.0",
            "example.com\\..\\x@v1.0.0",
            "example.com/x@v1/../../y",
        ] {
            assert!(matches!(bad.parse::<PackageRef>(), Err(ResolveError::InvalidPath { .. })), "{bad}");
        }
        assert!(matches!("/abs/x@v1.0.0".parse::<PackageRef>(), Err(ResolveError::NoViableSource { .. })));
    }

    #[test]
    fn dots_inside_segments_are_fine() {
        let p: PackageRef = "gopkg.in/yaml.v3@v3.0.1".parse().unwrap();
        assert!(p.validate().is_ok());
        assert!(PackageRef::new("example.com/a..b", "v1.0.0-rc..1").validate().is_ok());
    }

    #[test]
    fn parse_rejects_incomplete() {
        for bad in ["", "no-version", "@v1.0.0", "host.example/x@"] {
            assert!(matches!(bad.parse::<PackageRef>(), Err(ResolveError::InvalidPackageRef { .. })), "{bad}");
        }
    }
}
