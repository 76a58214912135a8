use std::fs;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync:        bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self { Self::default() }

    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to a uniquely named sibling, then rename over `path`.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: AtomicWriteOptions) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::NoParent { path: path.to_path_buf() })?;

    let tmp_path = parent.join(format!(".tmp.{}.modpin", uuid::Uuid::new_v4()));

    let staged = write_staged(&tmp_path, content, options);
    if let Err(e) = staged {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Rename {
            from:   tmp_path.clone(),
            to:     path.to_path_buf(),
            source: e,
        }
    })
}

fn write_staged(tmp_path: &Path, content: &[u8], options: AtomicWriteOptions) -> Result<()> {
    fs::write(tmp_path, content).map_err(Error::write(tmp_path))?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp_path, fs::Permissions::from_mode(mode)).map_err(Error::write(tmp_path))?;
    }

    if options.sync {
        fs::File::open(tmp_path)
            .and_then(|file| file.sync_all())
            .map_err(Error::write(tmp_path))?;
    }
    Ok(())
}
