//! Content hashes for fetched modules.
//!
//! Two independent digests are provided:
//!
//! - **Archive hash**: SHA-256 over the raw downloaded archive bytes. This is the
//!   canonical hash pinned in lock files.
//! - **Tree hash**: SHA-256 over a deterministic serialisation of an extracted
//!   directory (the `nix-archive-1` layout), for content-addressed stores that
//!   hash trees rather than archives.
//!
//! Both are rendered in Subresource Integrity form, `sha256-<base64>`.
//!
//! # Example
//!
//! ```
//! use modpin_verify::{Sri, archive_hash};
//!
//! let sri = archive_hash(b"");
//! assert_eq!(sri.to_string(), "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
//! assert_eq!(Sri::parse(&sri.to_string()).unwrap(), sri);
//! ```

pub use self::archive::{ArchiveHasher, archive_hash};
pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::reader::VerifiedReader;
pub use self::sri::{Algorithm, Sri};
pub use self::tree::{TREE_MAGIC, tree_hash, write_tree};

mod archive;
mod error;
mod hasher;
mod reader;
mod sri;
mod tree;
