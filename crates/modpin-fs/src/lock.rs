use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::{Error, Result};

/// Exclusive claim on a path, held by creating a marker file.
///
/// Creation uses `O_EXCL` semantics, so at most one holder exists across
/// processes. The marker is removed on drop.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Claim `path`, or `None` if someone else holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::write(parent))?;
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Some(Self { path: path.to_path_buf() }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(source) => Err(Error::Write { path: path.to_path_buf(), source }),
        }
    }

    /// Remove a marker left behind by a holder that has been gone longer than
    /// `max_age`. Returns whether it was removed.
    pub fn break_stale(path: impl AsRef<Path>, max_age: Duration) -> Result<bool> {
        let path = path.as_ref();
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(source) => return Err(Error::Write { path: path.to_path_buf(), source }),
        };

        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age < max_age {
            return Ok(false);
        }
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(Error::Write { path: path.to_path_buf(), source }),
        }
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl Drop for LockFile {
    fn drop(&mut self) { let _ = fs::remove_file(&self.path); }
}
