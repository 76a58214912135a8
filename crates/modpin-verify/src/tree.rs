//! Deterministic directory serialisation in the `nix-archive-1` layout.

use std::fs::{self, File, Metadata};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::{Hasher, Result, Sha256Hasher, Sri, VerifyError};

pub const TREE_MAGIC: &str = "nix-archive-1";

const PADDING: [u8; 8] = [0; 8];

/// Tree hash of `root` as SRI.
pub fn tree_hash(root: impl AsRef<Path>) -> Result<Sri> {
    let mut hasher = Sha256Hasher::new();
    write_tree(&mut hasher, root.as_ref())?;
    Ok(Sri::sha256(hasher.finalize()))
}

/// Serialise `root` into `out`.
pub fn write_tree<W: Write>(out: &mut W, root: &Path) -> Result<()> {
    let mut writer = TreeWriter { out };
    writer.str(TREE_MAGIC)?;
    let meta = lstat(root)?;
    writer.node(root, &meta)
}

struct TreeWriter<'w, W> {
    out: &'w mut W,
}

impl<W: Write> TreeWriter<'_, W> {
    fn node(&mut self, path: &Path, meta: &Metadata) -> Result<()> {
        self.str("(")?;
        self.str("type")?;

        let file_type = meta.file_type();
        if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(|source| read_error(path, source))?;
            self.str("symlink")?;
            self.str("target")?;
            self.bytes(target.as_os_str().as_encoded_bytes())?;
        } else if file_type.is_file() {
            self.str("regular")?;
            if is_executable(meta) {
                self.str("executable")?;
                self.str("")?;
            }
            self.str("contents")?;
            self.contents(path, meta.len())?;
        } else if file_type.is_dir() {
            self.str("directory")?;
            self.directory(path)?;
        } else {
            return Err(VerifyError::UnsupportedFileType { path: path.to_path_buf() });
        }

        self.str(")")
    }

    fn directory(&mut self, path: &Path) -> Result<()> {
        let mut children = fs::read_dir(path)
            .and_then(|it| it.collect::<io::Result<Vec<_>>>())
            .map_err(|source| read_error(path, source))?;
        children.sort_by(|a, b| a.file_name().as_encoded_bytes().cmp(b.file_name().as_encoded_bytes()));

        for child in children {
            let name = child.file_name();
            let child_path = child.path();
            let meta = lstat(&child_path)?;

            self.str("entry")?;
            self.str("(")?;
            self.str("name")?;
            self.bytes(name.as_encoded_bytes())?;
            self.str("node")?;
            self.node(&child_path, &meta)?;
            self.str(")")?;
        }
        Ok(())
    }

    /// Stream file contents without buffering the whole file.
    fn contents(&mut self, path: &Path, len: u64) -> Result<()> {
        let file = File::open(path).map_err(|source| read_error(path, source))?;
        self.out.write_all(&len.to_le_bytes())?;
        let copied = io::copy(&mut file.take(len), self.out).map_err(|source| read_error(path, source))?;
        if copied != len {
            return Err(VerifyError::SizeChanged { path: path.to_path_buf() });
        }
        self.pad(len)
    }

    fn str(&mut self, s: &str) -> Result<()> { self.bytes(s.as_bytes()) }

    fn bytes(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len() as u64;
        self.out.write_all(&len.to_le_bytes())?;
        self.out.write_all(data)?;
        self.pad(len)
    }

    fn pad(&mut self, len: u64) -> Result<()> {
        let rem = (len % 8) as usize;
        if rem != 0 {
            self.out.write_all(&PADDING[..8 - rem])?;
        }
        Ok(())
    }
}

fn lstat(path: &Path) -> Result<Metadata> {
    fs::symlink_metadata(path).map_err(|source| read_error(path, source))
}

fn read_error(path: &Path, source: io::Error) -> VerifyError {
    VerifyError::Read { path: path.to_path_buf(), source }
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &Metadata) -> bool { false }
