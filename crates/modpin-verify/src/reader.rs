use std::io::{self, Read};

use crate::{Hasher, Result, Sri, VerifyError};

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self { Self { reader, hasher } }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Finalize against an expected SRI hash.
    pub fn finish(self, expected: &Sri) -> Result<()> {
        let actual = Sri::sha256(self.hasher.finalize());
        if actual == *expected {
            Ok(())
        } else {
            Err(VerifyError::Mismatch {
                expected: expected.to_string(),
                actual:   actual.to_string(),
            })
        }
    }
}
