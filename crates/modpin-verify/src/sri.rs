use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{Result, VerifyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl FromStr for Algorithm {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(VerifyError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Subresource Integrity hash, `<algorithm>-<base64 digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sri {
    algorithm: Algorithm,
    digest:    Vec<u8>,
}

impl Sri {
    pub fn sha256(digest: Vec<u8>) -> Self { Self { algorithm: Algorithm::Sha256, digest } }

    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    pub fn digest(&self) -> &[u8] { &self.digest }

    pub fn to_hex(&self) -> String { hex::encode(&self.digest) }

    /// Parse `sha256-<digest>`; the digest may be base64 or lowercase hex.
    pub fn parse(s: &str) -> Result<Self> {
        let (algo, encoded) =
            s.split_once('-').ok_or_else(|| VerifyError::InvalidSri(s.to_string()))?;
        let algorithm: Algorithm = algo.parse()?;

        let digest = STANDARD
            .decode(encoded)
            .ok()
            .filter(|d| d.len() == algorithm.digest_len())
            .or_else(|| hex::decode(encoded).ok())
            .ok_or_else(|| VerifyError::InvalidSri(s.to_string()))?;

        if digest.len() != algorithm.digest_len() {
            return Err(VerifyError::DigestLength {
                algorithm: algorithm.name(),
                expected:  algorithm.digest_len(),
                actual:    digest.len(),
            });
        }
        Ok(Self { algorithm, digest })
    }
}

impl fmt::Display for Sri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm.name(), STANDARD.encode(&self.digest))
    }
}

impl FromStr for Sri {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SRI: &str = "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";
    const EMPTY_HEX: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_parse_base64() {
        let sri = Sri::parse(EMPTY_SRI).unwrap();
        assert_eq!(sri.algorithm(), Algorithm::Sha256);
        assert_eq!(sri.to_hex(), EMPTY_HEX);
        assert_eq!(sri.to_string(), EMPTY_SRI);
    }

    #[test]
    fn test_parse_hex() {
        let sri = Sri::parse(&format!("sha256-{EMPTY_HEX}")).unwrap();
        assert_eq!(sri.to_string(), EMPTY_SRI);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Sri::parse("sha256").is_err());
        assert!(matches!(Sri::parse("md5-abcd"), Err(VerifyError::UnsupportedAlgorithm(_))));
        assert!(Sri::parse("sha256-not base64").is_err());
        assert!(matches!(
            Sri::parse("sha256-AAAA"),
            Err(VerifyError::InvalidSri(_) | VerifyError::DigestLength { .. })
        ));
    }

    #[test]
    fn test_sha512_length_checked() {
        let digest = STANDARD.encode([7u8; 64]);
        let sri = Sri::parse(&format!("sha512-{digest}")).unwrap();
        assert_eq!(sri.algorithm(), Algorithm::Sha512);

        let short = STANDARD.encode([7u8; 32]);
        assert!(Sri::parse(&format!("sha512-{short}")).is_err());
    }
}
