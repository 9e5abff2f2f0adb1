//! Content fingerprints of uploaded documents.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("fingerprint must be 64 hex characters, got {0}")]
    Length(usize),
    #[error("fingerprint contains non-hex characters")]
    NotHex,
}

/// Lowercase hex SHA-256 digest of a document's raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Accept a digest computed elsewhere (e.g. by the upload layer).
    pub fn parse(text: &str) -> Result<Self, FingerprintError> {
        let text = text.trim();
        if text.len() != 64 {
            return Err(FingerprintError::Length(text.len()));
        }
        let bytes = hex::decode(text).map_err(|_| FingerprintError::NotHex)?;
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentFingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentFingerprint> for String {
    fn from(value: ContentFingerprint) -> Self {
        value.0
    }
}

impl core::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_known_bytes() {
        assert_eq!(
            ContentFingerprint::of(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parse_lowercases_uppercase_digests() {
        let upper = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert_eq!(ContentFingerprint::parse(upper).unwrap(), ContentFingerprint::of(b"abc"));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(ContentFingerprint::parse("abc"), Err(FingerprintError::Length(3)));
        let not_hex = "z".repeat(64);
        assert_eq!(ContentFingerprint::parse(&not_hex), Err(FingerprintError::NotHex));
    }
}
