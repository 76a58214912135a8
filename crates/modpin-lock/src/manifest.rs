use std::collections::BTreeMap;
use std::path::Path;

use modpin_fs::{AtomicWriteOptions, atomic_write};
use modpin_verify::Sri;
use serde::{Deserialize, Serialize};

use crate::{LockError, Result};

pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_LOCKFILE: &str = "modpin.lock.json";

/// The lock file: every module pinned to a version and archive hash.
///
/// Maps are ordered so that saving the same content always produces the same
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema:    u32,
    pub toolchain: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modules:   BTreeMap<String, ManifestModule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replace:   BTreeMap<String, ManifestReplace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestModule {
    pub version: String,
    pub hash:    String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url:     Option<String>,
    /// Full commit hash, for modules fetched at a pinned commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev:     Option<String>,
}

/// A replace directive: either another module fetched like any other, or a
/// directory in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestReplace {
    Remote(RemoteReplace),
    Local(LocalReplace),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoteReplace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_version:    Option<String>,
    pub target_path:    String,
    pub target_version: String,
    pub hash:           String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev:            Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalReplace {
    pub local_path: String,
}

impl ManifestReplace {
    pub fn local(path: impl Into<String>) -> Self { Self::Local(LocalReplace { local_path: path.into() }) }

    pub fn is_local(&self) -> bool { matches!(self, Self::Local(_)) }
}

impl Manifest {
    pub fn new(toolchain: impl Into<String>) -> Self {
        Self {
            schema:    SCHEMA_VERSION,
            toolchain: toolchain.into(),
            modules:   BTreeMap::new(),
            replace:   BTreeMap::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| LockError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&text).map_err(|e| match e {
            LockError::Decode(source) => LockError::Parse { path: path.to_path_buf(), source },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(text).map_err(LockError::Decode)?;
        if manifest.schema != SCHEMA_VERSION {
            return Err(LockError::UnsupportedSchema { found: manifest.schema, expected: SCHEMA_VERSION });
        }
        manifest.check_hashes()?;
        Ok(manifest)
    }

    /// Every pinned hash must be a well-formed SRI value.
    fn check_hashes(&self) -> Result<()> {
        let remote = self.replace.iter().filter_map(|(path, replace)| match replace {
            ManifestReplace::Remote(remote) => Some((path, &remote.hash)),
            ManifestReplace::Local(_) => None,
        });
        for (path, hash) in self.modules.iter().map(|(path, m)| (path, &m.hash)).chain(remote) {
            Sri::parse(hash).map_err(|source| LockError::InvalidHash { module: path.clone(), source })?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self).map_err(LockError::Serialize)?;
        text.push('\n');
        Ok(text)
    }

    /// Write atomically; readers see either the old file or the new one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        atomic_write(path, self.to_json()?.as_bytes(), AtomicWriteOptions::new())?;
        Ok(())
    }

    /// Whether `path` is served from a local directory.
    pub fn is_locally_replaced(&self, path: &str) -> bool {
        self.replace.get(path).is_some_and(ManifestReplace::is_local)
    }
}
