//! Manifest fingerprints

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of a manifest's source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    pub fn of_source(source: &str) -> Self {
        Self::from_bytes(source.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    /// Whether `source` is the text this checksum was taken from
    pub fn matches(&self, source: &str) -> bool {
        *self == Self::of_source(source)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_detects_edits() {
        let original = "repos:\n  - name: loom\n";
        let checksum = Checksum::of_source(original);
        assert!(checksum.matches(original));
        assert!(!checksum.matches("repos:\n  - name: vault\n"));
        assert_eq!(checksum.as_str().len(), 64);
        assert_eq!(checksum.short().len(), 12);
    }
}
