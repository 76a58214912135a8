use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use modpin_fs::{AtomicWriteOptions, CommitOutcome, LockFile, Workspace, atomic_write, is_populated_dir};
use modpin_source::PackageRef;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::{FetchError, Result};

const LOCK_POLL: Duration = Duration::from_millis(50);

/// Age after which a key lock is assumed to belong to a writer that died.
pub const DEFAULT_STALE_LOCK: Duration = Duration::from_secs(600);

/// A complete cache entry: extracted tree plus its sidecars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub dir:  PathBuf,
    pub hash: String,
    pub url:  Option<String>,
    pub rev:  Option<String>,
}

/// Sidecar contents written after a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    pub hash: String,
    pub url:  String,
    pub rev:  Option<String>,
}

/// On-disk module cache rooted at one directory.
///
/// Layout: `{root}/{escaped path}@{version}/` holds the extracted tree, with
/// `.hash`, `.url` and `.rev` files next to it. A directory whose `.hash` is
/// missing is treated as absent.
///
/// Writers serialise per key twice: an in-process mutex ([`ModuleCache::lock`])
/// and a `.lock` file next to the entry ([`ModuleCache::claim`]) that other
/// processes sharing the root also honour. Only the holder of the `.lock`
/// file moves trees into place or removes them.
#[derive(Debug)]
pub struct ModuleCache {
    root:       PathBuf,
    stale_lock: Duration,
    locks:      Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ModuleCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), stale_lock: DEFAULT_STALE_LOCK, locks: Mutex::default() }
    }

    pub fn with_stale_lock(mut self, after: Duration) -> Self {
        self.stale_lock = after;
        self
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn entry_dir(&self, package: &PackageRef) -> PathBuf { self.root.join(package.cache_key()) }

    pub fn lookup(&self, package: &PackageRef) -> Option<CacheEntry> { read_entry(&self.entry_dir(package)) }

    /// Serialise in-process population of one key.
    pub async fn lock(&self, package: &PackageRef) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(package.cache_key()).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Take the cross-process claim on one key, waiting while another writer
    /// holds it. A claim older than the stale-lock age is broken.
    pub async fn claim(&self, package: &PackageRef) -> Result<LockFile> {
        let path = sidecar(&self.entry_dir(package), "lock");
        loop {
            if let Some(claim) = LockFile::try_acquire(&path)? {
                return Ok(claim);
            }
            if LockFile::break_stale(&path, self.stale_lock)? {
                warn!(path = %path.display(), "removed abandoned cache lock");
                continue;
            }
            tokio::time::sleep(LOCK_POLL).await;
        }
    }

    /// A private staging directory under the cache root.
    pub fn staging(&self) -> Result<Workspace> {
        fs::create_dir_all(&self.root)
            .map_err(|source| modpin_fs::Error::Write { path: self.root.clone(), source })?;
        Ok(Workspace::new_in(&self.root)?)
    }

    /// Move `staged` into place and write its sidecars.
    ///
    /// When another writer got there first with a complete entry, the staged
    /// tree is dropped and the existing entry returned.
    pub async fn commit(&self, package: &PackageRef, staged: Workspace, record: &CacheRecord) -> Result<CacheEntry> {
        let dir = self.entry_dir(package);
        let _claim = self.claim(package).await?;

        if let Some(existing) = read_entry(&dir) {
            debug!(%package, "cache entry populated concurrently");
            return Ok(existing);
        }
        // Under the claim, a tree without `.hash` was left by a writer that died.
        if dir.exists() {
            debug!(dir = %dir.display(), "replacing incomplete cache entry");
            remove_dir(&dir)?;
        }

        if staged.commit(&dir)? == CommitOutcome::AlreadyPresent {
            return Err(FetchError::CacheConflict { path: dir });
        }

        write_sidecar(&dir, "url", &record.url);
        if let Some(rev) = &record.rev {
            write_sidecar(&dir, "rev", rev);
        }
        // Written last: its presence marks the entry complete.
        write_sidecar(&dir, "hash", &record.hash);

        Ok(CacheEntry { dir, hash: record.hash.clone(), url: Some(record.url.clone()), rev: record.rev.clone() })
    }

    /// Remove an entry and its sidecars. Returns whether anything was there.
    pub async fn evict(&self, package: &PackageRef) -> Result<bool> {
        let dir = self.entry_dir(package);
        let _claim = self.claim(package).await?;
        let mut removed = false;

        // `.hash` first, so the entry stops counting as complete before the tree goes.
        for ext in ["hash", "url", "rev"] {
            let path = sidecar(&dir, ext);
            match fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(FetchError::Evict { path, source }),
            }
        }
        if dir.exists() {
            remove_dir(&dir)?;
            removed = true;
        }
        Ok(removed)
    }
}

fn sidecar(dir: &Path, ext: &str) -> PathBuf {
    let mut name = dir.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn read_sidecar(dir: &Path, ext: &str) -> Option<String> {
    fs::read_to_string(sidecar(dir, ext)).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn write_sidecar(dir: &Path, ext: &str, value: &str) {
    let path = sidecar(dir, ext);
    if let Err(e) = atomic_write(&path, value.as_bytes(), AtomicWriteOptions::new()) {
        warn!(path = %path.display(), error = %e, "failed to write cache sidecar");
    }
}

fn read_entry(dir: &Path) -> Option<CacheEntry> {
    if !is_populated_dir(dir) {
        return None;
    }
    let hash = read_sidecar(dir, "hash")?;
    Some(CacheEntry {
        dir: dir.to_path_buf(),
        hash,
        url: read_sidecar(dir, "url"),
        rev: read_sidecar(dir, "rev"),
    })
}

fn remove_dir(dir: &Path) -> Result<()> {
    fs::remove_dir_all(dir).map_err(|source| FetchError::Evict { path: dir.to_path_buf(), source })
}
