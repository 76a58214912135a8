//! Which modules a lock or update run has to fetch, and how results land in
//! the manifest.

use std::collections::BTreeSet;

use modpin_fetch::FetchResult;
use modpin_lock::{
    Manifest, ManifestModule, ManifestReplace, RemoteReplace, ReplaceTarget, Replacement, Requirement, Requirements,
};
use modpin_source::PackageRef;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    Module(&'a Requirement),
    Replace(&'a Replacement),
}

/// One fetch and the manifest entry it fills.
#[derive(Debug, Clone)]
pub struct Job<'a> {
    pub slot:    Slot<'a>,
    pub package: PackageRef,
}

impl Job<'_> {
    /// Manifest key the result is stored under.
    pub fn key(&self) -> &str {
        match self.slot {
            Slot::Module(req) => &req.path,
            Slot::Replace(rep) => &rep.path,
        }
    }

    fn is_current(&self, manifest: &Manifest) -> bool {
        match self.slot {
            Slot::Module(req) => manifest.modules.get(&req.path).is_some_and(|m| m.version == req.version),
            Slot::Replace(rep) => matches!(
                manifest.replace.get(&rep.path),
                Some(ManifestReplace::Remote(r))
                    if r.target_path == self.package.path() && r.target_version == self.package.version()
            ),
        }
    }

    pub fn record(&self, manifest: &mut Manifest, result: &FetchResult) {
        match self.slot {
            Slot::Module(req) => {
                manifest.modules.insert(req.path.clone(), ManifestModule {
                    version: req.version.clone(),
                    hash:    result.hash.clone(),
                    url:     result.url.clone(),
                    rev:     result.rev.clone(),
                });
            }
            Slot::Replace(rep) => {
                manifest.replace.insert(
                    rep.path.clone(),
                    ManifestReplace::Remote(RemoteReplace {
                        old_version:    rep.old_version.clone(),
                        target_path:    self.package.path().to_string(),
                        target_version: self.package.version().to_string(),
                        hash:           result.hash.clone(),
                        url:            result.url.clone(),
                        rev:            result.rev.clone(),
                    }),
                );
            }
        }
    }
}

/// Every fetch a fresh lock file needs. Remote replacements are fetched at
/// their target; locally replaced modules are not fetched at all.
pub fn full(requirements: &Requirements) -> Vec<Job<'_>> {
    let replaced = requirements.replaces.iter().filter_map(|rep| match &rep.target {
        ReplaceTarget::Module { path, version } => {
            Some(Job { slot: Slot::Replace(rep), package: PackageRef::new(path, version) })
        }
        ReplaceTarget::Local(_) => None,
    });
    let required = requirements
        .requires
        .iter()
        .filter(|req| requirements.replacement(&req.path).is_none())
        .map(|req| Job { slot: Slot::Module(req), package: PackageRef::new(&req.path, &req.version) });

    replaced.chain(required).collect()
}

/// Fetches for an update: the named modules, or everything stale when none
/// are named.
pub fn update<'a>(requirements: &'a Requirements, manifest: &Manifest, only: &[String]) -> CliResult<Vec<Job<'a>>> {
    let jobs = full(requirements);
    if only.is_empty() {
        return Ok(jobs.into_iter().filter(|job| !job.is_current(manifest)).collect());
    }

    if let Some(unknown) = only.iter().find(|path| !jobs.iter().any(|job| job.key() == path.as_str())) {
        return Err(CliError::UnknownModule { path: unknown.clone() });
    }
    Ok(jobs.into_iter().filter(|job| only.iter().any(|path| path == job.key())).collect())
}

/// Bring the parts of `manifest` that need no download in line with
/// `requirements`: toolchain, local replacements, and removed modules.
pub fn sync(manifest: &mut Manifest, requirements: &Requirements) {
    if let Some(toolchain) = &requirements.toolchain {
        manifest.toolchain = toolchain.clone();
    }

    for rep in &requirements.replaces {
        if let ReplaceTarget::Local(dir) = &rep.target {
            manifest.replace.insert(rep.path.clone(), ManifestReplace::local(dir));
        }
    }

    let required: BTreeSet<&str> = requirements
        .requires
        .iter()
        .filter(|req| requirements.replacement(&req.path).is_none())
        .map(|req| req.path.as_str())
        .collect();
    let replaced: BTreeSet<&str> = requirements.replaces.iter().map(|rep| rep.path.as_str()).collect();

    manifest.modules.retain(|path, _| required.contains(path.as_str()));
    manifest.replace.retain(|path, _| replaced.contains(path.as_str()));
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const LIST: &str = "go 1.22\n\
                        a.example/keep v1.0.0\n\
                        a.example/bump v1.1.0\n\
                        a.example/old v1.0.0 => a.example/fork v1.0.1\n\
                        a.example/dev => ./dev\n";

    fn result(hash: &str) -> FetchResult {
        FetchResult {
            package: PackageRef::new("unused", "v0"),
            dir:     PathBuf::from("/cache/x"),
            hash:    hash.into(),
            url:     Some("https://example/x.zip".into()),
            rev:     None,
        }
    }

    fn locked() -> Manifest {
        let requirements = Requirements::parse(LIST).unwrap();
        let mut manifest = Manifest::new("1.21");
        for job in full(&requirements) {
            job.record(&mut manifest, &result("sha256-old"));
        }
        manifest
    }

    #[test]
    fn full_plan_skips_local_and_fetches_replacement_target() {
        let requirements = Requirements::parse(LIST).unwrap();
        let packages: Vec<String> = full(&requirements).iter().map(|j| j.package.to_string()).collect();
        assert_eq!(packages, ["a.example/fork@v1.0.1", "a.example/keep@v1.0.0", "a.example/bump@v1.1.0"]);
    }

    #[test]
    fn update_fetches_only_stale_entries() {
        let mut manifest = locked();
        manifest.modules.get_mut("a.example/bump").unwrap().version = "v1.0.0".into();

        let requirements = Requirements::parse(LIST).unwrap();
        let jobs = update(&requirements, &manifest, &[]).unwrap();

        let keys: Vec<&str> = jobs.iter().map(Job::key).collect();
        assert_eq!(keys, ["a.example/bump"]);
    }

    #[test]
    fn update_named_module_refetches_even_when_current() {
        let requirements = Requirements::parse(LIST).unwrap();
        let jobs = update(&requirements, &locked(), &["a.example/keep".into()]).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].package.to_string(), "a.example/keep@v1.0.0");
    }

    #[test]
    fn update_unknown_module_is_an_error() {
        let requirements = Requirements::parse(LIST).unwrap();
        let err = update(&requirements, &locked(), &["a.example/nope".into()]).unwrap_err();
        assert!(matches!(err, CliError::UnknownModule { path } if path == "a.example/nope"));
    }

    #[test]
    fn sync_then_diff_is_clean() {
        let requirements = Requirements::parse(LIST).unwrap();
        let mut manifest = locked();
        manifest.modules.insert("a.example/gone".into(), ManifestModule {
            version: "v0.1.0".into(),
            hash:    "sha256-x".into(),
            url:     None,
            rev:     None,
        });

        sync(&mut manifest, &requirements);

        assert_eq!(manifest.toolchain, "1.22");
        assert!(manifest.is_locally_replaced("a.example/dev"));
        assert!(!manifest.modules.contains_key("a.example/gone"));
        assert!(manifest.diff(&requirements).is_clean());
    }
}
