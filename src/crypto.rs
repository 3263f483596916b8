//! MD5 digests for candidate passwords

use crate::error::{ConfigError, Result};
use md5::{Digest, Md5};
use std::fmt;
use std::str::FromStr;

/// Length of an MD5 digest in bytes
pub const DIGEST_LEN: usize = 16;

/// Raw 128-bit digest
pub type RawDigest = [u8; DIGEST_LEN];

/// Hash arbitrary bytes
#[inline]
pub fn md5_raw(input: &[u8]) -> RawDigest {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Md5::digest(input));
    out
}

/// Hash arbitrary bytes and render as 32 lowercase hex characters
pub fn md5_hex(input: &[u8]) -> String {
    hex::encode(md5_raw(input))
}

/// The digest a search is looking for.
///
/// Comparison happens on raw bytes so the hot loop never formats hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDigest(RawDigest);

impl TargetDigest {
    /// Parse a 32-character hex digest (either case)
    pub fn from_hex(digest: &str) -> Result<Self> {
        let trimmed = digest.trim();
        if trimmed.len() != DIGEST_LEN * 2 {
            return Err(ConfigError::InvalidDigest(digest.to_string()).into());
        }
        let mut raw = [0u8; DIGEST_LEN];
        hex::decode_to_slice(trimmed, &mut raw)
            .map_err(|_| ConfigError::InvalidDigest(digest.to_string()))?;
        Ok(Self(raw))
    }

    /// Target for a known plaintext
    pub fn of_password(password: &str) -> Self {
        Self(md5_raw(password.as_bytes()))
    }

    #[inline]
    pub fn matches(&self, digest: &RawDigest) -> bool {
        &self.0 == digest
    }

    /// Compare against a rendered digest; case-insensitive
    pub fn matches_hex(&self, digest: &str) -> bool {
        digest.eq_ignore_ascii_case(&self.to_hex())
    }

    pub fn as_bytes(&self) -> &RawDigest {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TargetDigest {
    type Err = crate::error::SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for TargetDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(md5_hex(b"ab"), "187ef4436122d1cc2f40dc2b92f0eba0");
    }

    #[test]
    fn test_target_parsing() {
        let target = TargetDigest::from_hex("900150983CD24FB0D6963F7D28E17F72").unwrap();
        assert_eq!(target, TargetDigest::of_password("abc"));
        assert_eq!(target.to_hex(), "900150983cd24fb0d6963f7d28e17f72");
        assert!(target.matches(&md5_raw(b"abc")));
        assert!(target.matches_hex("900150983cd24fb0d6963f7d28e17f72"));

        assert!(TargetDigest::from_hex("abc").is_err());
        assert!(TargetDigest::from_hex("zz0150983cd24fb0d6963f7d28e17f72").is_err());
        assert!("".parse::<TargetDigest>().is_err());
    }
}
