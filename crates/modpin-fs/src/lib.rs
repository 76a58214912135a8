//! Atomic filesystem primitives used by the module cache.
//!
//! Everything here follows the same pattern: produce output at a private sibling
//! path, then `rename` it into place. A reader never observes a half-written file
//! or directory under the final name.

mod atomic_write;
mod commit;
mod error;
mod lock;
mod workspace;

pub use self::atomic_write::{AtomicWriteOptions, atomic_write};
pub use self::commit::{CommitOutcome, commit_dir, is_populated_dir};
pub use self::error::{Error, Result};
pub use self::lock::LockFile;
pub use self::workspace::Workspace;
