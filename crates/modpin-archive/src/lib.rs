//! Extraction of module archives.
//!
//! Module zips nest every file under a single root directory, usually
//! `path@version/`. Extraction strips that root, rejects entries that would land
//! outside the destination, and keeps unix permission bits where the archive
//! records them.

mod error;
mod extract;
mod options;
mod sanitize;

pub use self::error::{ArchiveError, Result};
pub use self::extract::{ExtractReport, extract_zip};
pub use self::options::{ExtractOptions, StripRoot};
