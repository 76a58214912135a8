use std::fs;
use std::path::{Path, PathBuf};

use crate::{CommitOutcome, Error, Result, commit_dir};

/// Private staging directory, removed on drop unless committed.
#[derive(Debug)]
pub struct Workspace {
    staging_path: PathBuf,
    committed:    bool,
}

impl Workspace {
    /// Create a uniquely named staging directory inside `parent`.
    ///
    /// Staging next to the destination keeps the final rename on one filesystem.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        let staging_path = parent.join(format!(".staging.{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&staging_path).map_err(Error::write(&staging_path))?;
        Ok(Self { staging_path, committed: false })
    }

    pub fn path(&self) -> &Path { &self.staging_path }

    pub fn commit(mut self, destination: impl AsRef<Path>) -> Result<CommitOutcome> {
        let outcome = commit_dir(&self.staging_path, destination)?;
        self.committed = outcome == CommitOutcome::Committed;
        Ok(outcome)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_dir_all(&self.staging_path);
        }
    }
}
