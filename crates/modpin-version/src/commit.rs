use once_cell::sync::Lazy;
use regex::Regex;

/// Length of a full hex-encoded SHA-1 commit id.
pub const FULL_COMMIT_LEN: usize = 40;

static COMMIT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{7,40}$").unwrap());

/// Lowercase hex commit id, abbreviated or full.
pub fn is_commit_hash(s: &str) -> bool { COMMIT_REGEX.is_match(s) }

/// A commit id usable for pinned fetches; abbreviated ids are not.
pub fn is_full_commit(s: &str) -> bool { s.len() == FULL_COMMIT_LEN && is_commit_hash(s) }
