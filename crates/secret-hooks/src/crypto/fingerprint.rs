//! Value fingerprints.
//!
//! Logs identify secret values by a truncated SHA-256 digest so that two
//! versions can be told apart without the value itself being written out.

use sha2::{Digest, Sha256};

/// Hex of the first 8 bytes of SHA-256(`data`).
pub fn fingerprint(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    hex::encode(&hash[..8])
}
