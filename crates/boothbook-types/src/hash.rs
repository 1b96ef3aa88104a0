use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Hex identifier of an object in the remote repository.
///
/// Blobs, trees, and commits are all addressed by a hash of their content.
/// The remote store decides the hash function (SHA-1 for GitHub, BLAKE3 for
/// the in-memory store), so the identifier is kept as its lowercase hex text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHash(String);

impl ObjectHash {
    /// Parse a hash from hex text, normalizing to lowercase.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidHash(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Compute the BLAKE3 hash of `data`, domain-separated by `kind`.
    pub fn of_content(kind: &str, data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_bytes());
        hasher.update(&[0]);
        hasher.update(data);
        Self(hasher.finalize().to_hex().to_string())
    }

    /// The full hex text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHash({})", self.short())
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ObjectHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
