use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::Path;

use crate::sanitize::{link_target, relative_path, strip_root};

const FILE_TYPE_MASK: u32 = 0o170000;
const SYMLINK_TYPE: u32 = 0o120000;
use crate::{ArchiveError, ExtractOptions, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Regular files written.
    pub entry_count: usize,
    pub total_bytes: u64,
    pub symlink_count: usize,
}

/// Extract a zip archive into `dest`, creating it if needed.
pub fn extract_zip<R: Read + Seek>(reader: R, dest: &Path, options: &ExtractOptions) -> Result<ExtractReport> {
    let mut archive = zip::ZipArchive::new(reader).map_err(ArchiveError::corrupted)?;
    create_dir(dest)?;

    let mut report = ExtractReport::default();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(ArchiveError::corrupted)?;

        let Some(name) = strip_root(entry.name(), &options.strip) else {
            continue;
        };
        let relative = relative_path(name)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(&relative);

        if entry.is_dir() {
            create_dir(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }

        if entry.unix_mode().is_some_and(|m| m & FILE_TYPE_MASK == SYMLINK_TYPE) {
            let mut link = String::new();
            entry
                .read_to_string(&mut link)
                .map_err(|e| ArchiveError::Corrupted { reason: e.to_string() })?;
            let link_to = link_target(&relative, &link)?;
            if make_symlink(&link_to, &target)? {
                report.symlink_count += 1;
            }
            continue;
        }

        let mode = entry.unix_mode().map(|m| m & 0o777).filter(|m| *m != 0);
        let written = write_file(&mut entry, &target)?;
        set_mode(&target, mode.unwrap_or(options.default_mode))?;

        report.entry_count += 1;
        report.total_bytes += written;
    }

    if report.entry_count == 0 {
        return Err(ArchiveError::Empty);
    }
    Ok(report)
}

fn write_file(entry: &mut impl Read, target: &Path) -> Result<u64> {
    let failed = |source: io::Error| match source.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            ArchiveError::Corrupted { reason: source.to_string() }
        }
        _ => ArchiveError::ExtractionFailed { path: target.to_path_buf(), source },
    };
    let mut file = File::create(target).map_err(failed)?;
    io::copy(entry, &mut file).map_err(failed)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ArchiveError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns whether a link was created; platforms without symlinks skip them.
#[cfg(unix)]
fn make_symlink(link_to: &Path, target: &Path) -> Result<bool> {
    std::os::unix::fs::symlink(link_to, target)
        .map(|()| true)
        .map_err(|source| ArchiveError::ExtractionFailed { path: target.to_path_buf(), source })
}

#[cfg(not(unix))]
fn make_symlink(_link_to: &Path, _target: &Path) -> Result<bool> { Ok(false) }

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|source| {
        ArchiveError::ExtractionFailed { path: path.to_path_buf(), source }
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> { Ok(()) }
