use std::path::Path;

use crate::{LockError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub path:    String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    Module { path: String, version: String },
    Local(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub path:        String,
    pub old_version: Option<String>,
    pub target:      ReplaceTarget,
}

/// The flat module list a lock file is generated from.
///
/// One entry per line, in the shape printed by `go list -m all`:
///
/// ```text
/// # comment
/// toolchain 1.22
/// example.com/main
/// golang.org/x/text v0.14.0
/// example.com/old v1.0.0 => example.com/fork v1.0.1
/// example.com/dev => ./dev
/// ```
///
/// A bare path without a version names the main module and is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    pub toolchain: Option<String>,
    pub requires:  Vec<Requirement>,
    pub replaces:  Vec<Replacement>,
}

impl Requirements {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| LockError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut out = Self::default();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            out.parse_line(line).map_err(|message| LockError::Requirements { line: index + 1, message })?;
        }
        Ok(out)
    }

    fn parse_line(&mut self, line: &str) -> std::result::Result<(), String> {
        if let Some((left, right)) = line.split_once("=>") {
            let (path, old_version) = module_tokens(left)?;
            let path = path.ok_or("replace directive without a module path")?;
            let target = match right.split_whitespace().collect::<Vec<_>>()[..] {
                [dir] if is_local_path(dir) => ReplaceTarget::Local(dir.to_string()),
                [target, version] => ReplaceTarget::Module { path: target.into(), version: version.into() },
                _ => return Err(format!("invalid replacement target '{}'", right.trim())),
            };
            if let Some(version) = &old_version {
                self.requires.push(Requirement { path: path.clone(), version: version.clone() });
            }
            self.replaces.push(Replacement { path, old_version, target });
            return Ok(());
        }

        match line.split_whitespace().collect::<Vec<_>>()[..] {
            ["toolchain" | "go", version] => self.toolchain = Some(version.to_string()),
            [path, version] => self.requires.push(Requirement { path: path.into(), version: version.into() }),
            [token] => {
                if let Some((path, version)) = token.rsplit_once('@').filter(|(p, v)| !p.is_empty() && !v.is_empty()) {
                    self.requires.push(Requirement { path: path.into(), version: version.into() });
                }
            }
            _ => return Err(format!("expected 'path version', found '{line}'")),
        }
        Ok(())
    }

    pub fn replacement(&self, path: &str) -> Option<&Replacement> { self.replaces.iter().find(|r| r.path == path) }

    pub fn requirement(&self, path: &str) -> Option<&Requirement> { self.requires.iter().find(|r| r.path == path) }
}

fn module_tokens(text: &str) -> std::result::Result<(Option<String>, Option<String>), String> {
    match text.split_whitespace().collect::<Vec<_>>()[..] {
        [] => Ok((None, None)),
        [path] => Ok((Some(path.into()), None)),
        [path, version] => Ok((Some(path.into()), Some(version.into()))),
        _ => Err(format!("invalid module '{}'", text.trim())),
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with("./") || target.starts_with("../") || target.starts_with('/') || target == "." || target == ".."
}
