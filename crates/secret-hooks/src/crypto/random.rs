//! Secure random generation.
//!
//! Uses the thread-local CSPRNG from `rand`, which is seeded from and
//! periodically reseeded by the operating system's random source.

use base64::Engine;
use rand::{Rng, RngCore};
use zeroize::Zeroize;

/// Fill a buffer with cryptographically secure random bytes.
pub fn fill_random(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Generate a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill_random(&mut buf);
    buf
}

/// Draw `length` characters uniformly from `alphabet`.
///
/// Returns an empty string when `alphabet` is empty.
pub fn random_string(alphabet: &[char], length: usize) -> String {
    if alphabet.is_empty() {
        return String::new();
    }
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect()
}

/// URL-safe base64 (unpadded) token carrying `entropy_bytes` random bytes.
pub fn urlsafe_token(entropy_bytes: usize) -> String {
    let mut raw = vec![0u8; entropy_bytes];
    fill_random(&mut raw);
    let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&raw);
    raw.zeroize();
    token
}
