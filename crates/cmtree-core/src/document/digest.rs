//! Document digest.
//!
//! Same input, same digest: the rendering is deterministic for a given
//! change-set and header, so the digest identifies a commit's payload.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the rendered document (64 characters)
pub fn document_digest(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    hex::encode(hasher.finalize())
}
