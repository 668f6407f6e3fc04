//! Cryptographic primitives for secret-hooks.
//!
//! This module provides:
//! - Cryptographically secure random bytes, passwords and URL-safe tokens
//! - SHA-256 fingerprints for identifying secret values in logs

pub mod fingerprint;
pub mod random;
