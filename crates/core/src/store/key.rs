//! Deterministic cache-key derivation.
//!
//! Keys are derived from the request method and canonical URL so that
//! the same read always addresses the same entry across restarts.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// Only safe reads are ever cached, but the method still participates in
/// the key so GET and HEAD responses for one URL stay distinct.
pub fn cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
