use std::collections::BTreeSet;
use std::fmt;

use crate::{Manifest, ManifestReplace, ReplaceTarget, Requirements};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub path:     String,
    pub locked:   String,
    pub required: String,
}

/// Drift between a lock file and the requirements it should describe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockDiff {
    /// `(locked, required)` toolchain versions when they differ.
    pub toolchain:  Option<(String, String)>,
    /// Required but not locked, as `path@version`.
    pub missing:    Vec<String>,
    /// Locked but no longer required.
    pub extra:      Vec<String>,
    pub mismatched: Vec<Mismatch>,
}

impl LockDiff {
    pub fn is_clean(&self) -> bool {
        self.toolchain.is_none() && self.missing.is_empty() && self.extra.is_empty() && self.mismatched.is_empty()
    }
}

impl Manifest {
    /// Compare against `requirements`. Locally replaced modules are exempt.
    pub fn diff(&self, requirements: &Requirements) -> LockDiff {
        let mut diff = LockDiff::default();

        if let Some(required) = &requirements.toolchain {
            if *required != self.toolchain {
                diff.toolchain = Some((self.toolchain.clone(), required.clone()));
            }
        }

        for req in &requirements.requires {
            if self.is_locally_replaced(&req.path) {
                continue;
            }
            match requirements.replacement(&req.path).map(|r| &r.target) {
                Some(ReplaceTarget::Local(_)) => continue,
                Some(ReplaceTarget::Module { path, version }) => {
                    let required = format!("{path}@{version}");
                    match self.replace.get(&req.path) {
                        Some(ManifestReplace::Remote(locked))
                            if locked.target_path == *path && locked.target_version == *version => {}
                        Some(ManifestReplace::Remote(locked)) => diff.mismatched.push(Mismatch {
                            path: req.path.clone(),
                            locked: format!("{}@{}", locked.target_path, locked.target_version),
                            required,
                        }),
                        _ => diff.missing.push(format!("{}@{} => {required}", req.path, req.version)),
                    }
                }
                None => match self.modules.get(&req.path) {
                    None => diff.missing.push(format!("{}@{}", req.path, req.version)),
                    Some(locked) if locked.version != req.version => diff.mismatched.push(Mismatch {
                        path:     req.path.clone(),
                        locked:   locked.version.clone(),
                        required: req.version.clone(),
                    }),
                    Some(_) => {}
                },
            }
        }

        let required: BTreeSet<&str> = requirements.requires.iter().map(|r| r.path.as_str()).collect();
        diff.extra = self.modules.keys().filter(|path| !required.contains(path.as_str())).cloned().collect();

        diff.missing.sort();
        diff.mismatched.sort_by(|a, b| a.path.cmp(&b.path));
        diff
    }
}

impl fmt::Display for LockDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "lock file is in sync");
        }
        write!(f, "lock file is out of sync:")?;
        if let Some((locked, required)) = &self.toolchain {
            write!(f, "\n\ntoolchain: locked={locked}, required={required}")?;
        }
        if !self.missing.is_empty() {
            write!(f, "\n\nmissing from lock file:")?;
            for entry in &self.missing {
                write!(f, "\n  + {entry}")?;
            }
        }
        if !self.extra.is_empty() {
            write!(f, "\n\nextra in lock file:")?;
            for entry in &self.extra {
                write!(f, "\n  - {entry}")?;
            }
        }
        if !self.mismatched.is_empty() {
            write!(f, "\n\nversion mismatches:")?;
            for m in &self.mismatched {
                write!(f, "\n  ! {}: locked={}, required={}", m.path, m.locked, m.required)?;
            }
        }
        Ok(())
    }
}
