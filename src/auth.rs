//! Authentication
//!
//! Clients send the lowercase hex SHA-256 of their raw key. The server hashes
//! its configured keys the same way at startup and compares digests in
//! constant time.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a raw authentication key
pub fn hash_auth_key(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Byte comparison whose running time does not depend on where inputs differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Set of accepted key digests
#[derive(Debug, Clone)]
pub struct Authenticator {
    digests: Vec<String>,
}

impl Authenticator {
    /// Hash every raw key once
    pub fn new<I, S>(raw_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            digests: raw_keys
                .into_iter()
                .map(|key| hash_auth_key(key.as_ref()))
                .collect(),
        }
    }

    /// Whether a client-supplied digest matches any configured key
    ///
    /// Every digest is compared even after a match.
    pub fn is_authenticated(&self, digest: &str) -> bool {
        self.digests
            .iter()
            .fold(false, |found, stored| {
                constant_time_eq(stored.as_bytes(), digest.as_bytes()) | found
            })
    }

    pub fn key_count(&self) -> usize {
        self.digests.len()
    }
}
