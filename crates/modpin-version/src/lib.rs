//! Version classification for module releases.
//!
//! A module version is either a tagged release (`v1.2.3`, `v2.0.0-rc.1`,
//! `v3.1.0+incompatible`) or a commit snapshot (`v0.0.0-20231201120000-abcdef123456`)
//! that encodes a timestamp and a short commit hash.
//!
//! Classification is a pure string operation and never fails; malformed input
//! is reported as a tagged version and left for downstream consumers to reject.

pub use self::class::{SNAPSHOT_PREFIX, VersionClass, classify};
pub use self::commit::{FULL_COMMIT_LEN, is_commit_hash, is_full_commit};

mod class;
mod commit;
