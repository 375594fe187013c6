//! SHA-256 certificate fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque 32-byte certificate identity (SHA-256 of the DER encoding).
///
/// Totally ordered by lexicographic byte comparison; the textual form is
/// canonical uppercase hex with no separators.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_der(der: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(der);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FingerprintParseError {
    #[error("fingerprint must be exactly 64 hex characters, got {0}")]
    WrongLength(usize),
    #[error("fingerprint contains non-hex characters")]
    InvalidHex,
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(FingerprintParseError::WrongLength(s.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            let hi = s.as_bytes()[i * 2] as char;
            let lo = s.as_bytes()[i * 2 + 1] as char;
            let hi = hi.to_digit(16).ok_or(FingerprintParseError::InvalidHex)?;
            let lo = lo.to_digit(16).ok_or(FingerprintParseError::InvalidHex)?;
            *chunk = ((hi << 4) | lo) as u8;
        }
        Ok(Self(bytes))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let fp = Fingerprint::from_der(b"hello world");
        let text = fp.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text, text.to_uppercase());
        let parsed: Fingerprint = text.parse().unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn ordering_is_lexicographic_on_bytes() {
        let a = Fingerprint::from_bytes([0u8; 32]);
        let mut hi = [0u8; 32];
        hi[0] = 1;
        let b = Fingerprint::from_bytes(hi);
        assert!(a < b);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "abc".parse::<Fingerprint>(),
            Err(FingerprintParseError::WrongLength(3))
        ));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "g".repeat(64);
        assert!(matches!(
            bad.parse::<Fingerprint>(),
            Err(FingerprintParseError::InvalidHex)
        ));
    }

    #[test]
    fn json_round_trip() {
        let fp = Fingerprint::from_der(b"cert bytes");
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
    }
}
