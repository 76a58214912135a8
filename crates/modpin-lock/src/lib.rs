//! Lock file model for fetched modules.
//!
//! A [`Manifest`] pins every required module to a version, an archive hash and,
//! where known, the exact source URL and commit. It is stored as pretty-printed
//! JSON with sorted keys so regenerating an unchanged lock file is a no-op.
//! [`Manifest::diff`] reports drift against a [`Requirements`] list.

mod diff;
mod error;
mod manifest;
mod requirements;

pub use self::diff::{LockDiff, Mismatch};
pub use self::error::{LockError, Result};
pub use self::manifest::{
    DEFAULT_LOCKFILE, LocalReplace, Manifest, ManifestModule, ManifestReplace, RemoteReplace, SCHEMA_VERSION,
};
pub use self::requirements::{ReplaceTarget, Replacement, Requirement, Requirements};
