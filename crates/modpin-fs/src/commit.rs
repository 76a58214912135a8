use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// `src` now lives at `dest`.
    Committed,
    /// `dest` was already populated; `src` was left untouched.
    AlreadyPresent,
}

/// Move a fully staged directory to its final location.
///
/// Rename is the commit point. If another writer got there first the existing
/// directory wins and the caller keeps ownership of `src`.
pub fn commit_dir(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<CommitOutcome> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(Error::write(parent))?;
    }

    if is_populated_dir(dest) {
        return Ok(CommitOutcome::AlreadyPresent);
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(CommitOutcome::Committed),
        Err(e)
            if matches!(e.kind(), ErrorKind::DirectoryNotEmpty | ErrorKind::AlreadyExists)
                || is_populated_dir(dest) =>
        {
            Ok(CommitOutcome::AlreadyPresent)
        }
        Err(source) => Err(Error::Rename {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        }),
    }
}

/// A directory with at least one entry.
pub fn is_populated_dir(path: impl AsRef<Path>) -> bool {
    fs::read_dir(path).map(|mut entries| entries.next().is_some()).unwrap_or(false)
}
