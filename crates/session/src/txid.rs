//! Transaction identifiers.

use std::fmt;

use ledger_core::Identity;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Hex digest of a random nonce and the creator identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Fresh id for a proposal created by `creator`.
    pub fn generate(creator: &Identity) -> Self {
        let nonce: [u8; NONCE_LEN] = rand::random();
        Self::from_parts(&nonce, creator)
    }

    pub fn from_parts(nonce: &[u8], creator: &Identity) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(nonce);
        hasher.update(&creator.creator());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
