use crate::{Hasher, Sha256Hasher, Sri};

/// SHA-256 of archive bytes as SRI.
pub fn archive_hash(bytes: &[u8]) -> Sri { Sri::sha256(Sha256Hasher::digest(bytes)) }

/// Incremental archive hasher for bodies that arrive in chunks.
#[derive(Default)]
pub struct ArchiveHasher {
    inner: Sha256Hasher,
    len:   u64,
}

impl ArchiveHasher {
    pub fn new() -> Self { Self::default() }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Bytes seen so far.
    pub fn len(&self) -> u64 { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn finish(self) -> Sri { Sri::sha256(self.inner.finalize()) }
}
