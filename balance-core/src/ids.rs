//! Deterministic short ids.

use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest
pub const ID_HEX_LEN: usize = 16;

/// SHA-256 of `raw`, hex encoded and truncated to [`ID_HEX_LEN`].
pub fn short_hash(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(ID_HEX_LEN);
    hex
}
