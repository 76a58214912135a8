use std::path::{Component, Path, PathBuf};

use crate::{ArchiveError, Result, StripRoot};

/// Apply the strip policy to a raw entry name. `None` means the entry vanished.
pub(crate) fn strip_root<'a>(name: &'a str, strip: &StripRoot) -> Option<&'a str> {
    let stripped = match strip {
        StripRoot::None => name,
        StripRoot::FirstSegment => first_segment_stripped(name),
        StripRoot::Prefix(prefix) => name
            .strip_prefix(prefix.as_str())
            .unwrap_or_else(|| first_segment_stripped(name)),
    };
    (!stripped.is_empty()).then_some(stripped)
}

fn first_segment_stripped(name: &str) -> &str {
    name.split_once('/').map_or(name, |(_, rest)| rest)
}

/// Resolve an entry name to a path relative to the destination.
///
/// Rejects absolute names and any `..` that would climb above the root.
pub(crate) fn relative_path(name: &str) -> Result<PathBuf> {
    let slip = || ArchiveError::ZipSlip { entry: name.to_string() };
    let mut result = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    return Err(slip());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(slip()),
        }
    }
    Ok(result)
}

/// Check a symlink target against the destination root.
///
/// `link` is the link's own path relative to the root. The target must be
/// relative and, resolved from the link's directory, must not climb above the
/// root.
pub(crate) fn link_target(link: &Path, target: &str) -> Result<PathBuf> {
    let escape = || ArchiveError::SymlinkEscape {
        entry: link.display().to_string(),
        target: target.to_string(),
    };
    let target_path = Path::new(target);
    if target.is_empty() || target_path.has_root() {
        return Err(escape());
    }

    let mut resolved = link.parent().map(Path::to_path_buf).unwrap_or_default();
    for component in target_path.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }
    Ok(target_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_exact_prefix() {
        let strip = StripRoot::Prefix("example.com/m@v1.0.0/".into());
        assert_eq!(strip_root("example.com/m@v1.0.0/go.mod", &strip), Some("go.mod"));
        assert_eq!(strip_root("example.com/m@v1.0.0/", &strip), None);
    }

    #[test]
    fn strip_falls_back_to_first_segment() {
        let strip = StripRoot::Prefix("example.com/m@v1.0.0/".into());
        assert_eq!(strip_root("repo-abc123/pkg/a.go", &strip), Some("pkg/a.go"));
        assert_eq!(strip_root("repo-abc123/", &strip), None);
        assert_eq!(strip_root("toplevel.txt", &strip), Some("toplevel.txt"));
    }

    #[test]
    fn no_strip_keeps_name() {
        assert_eq!(strip_root("a/b", &StripRoot::None), Some("a/b"));
    }

    #[test]
    fn relative_path_normalizes() {
        assert_eq!(relative_path("a/./b/../c").unwrap(), PathBuf::from("a/c"));
    }

    #[test]
    fn zip_slip_rejected() {
        assert!(matches!(relative_path("../etc/passwd"), Err(ArchiveError::ZipSlip { .. })));
        assert!(matches!(relative_path("a/../../x"), Err(ArchiveError::ZipSlip { .. })));
        assert!(matches!(relative_path("/etc/passwd"), Err(ArchiveError::ZipSlip { .. })));
    }

    #[test]
    fn link_within_root_is_kept() {
        let target = link_target(Path::new("pkg/current"), "../lib/v2").unwrap();
        assert_eq!(target, PathBuf::from("../lib/v2"));
        assert!(link_target(Path::new("top"), "./sub/file").is_ok());
    }

    #[test]
    fn link_escaping_root_rejected() {
        let escaped = |link: &str, target: &str| {
            matches!(link_target(Path::new(link), target), Err(ArchiveError::SymlinkEscape { .. }))
        };
        assert!(escaped("top", ".."));
        assert!(escaped("pkg/link", "../../etc/passwd"));
        assert!(escaped("pkg/link", "/etc/passwd"));
        assert!(escaped("pkg/link", ""));
    }
}
