//! Secret Type Policy — classification, generation and validation.
//!
//! A secret's shape decides how it is rotated. Classification looks at
//! field names only, in the fixed priority order
//! `api_key > password > key > unknown`: an `api_key` marks an externally
//! issued credential and must never be regenerated, even if the value also
//! carries a `password` or `key`.
//!
//! Validation enforces minimum lengths only. It is a guard against broken
//! generation, not a strength estimator.

use serde::{Deserialize, Serialize};

use crate::crypto::random;
use crate::error::{HookError, Result};
use crate::secret::SecretValue;

pub const FIELD_API_KEY: &str = "api_key";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_KEY: &str = "key";

/// Punctuation mixed into generated passwords by default.
pub const DEFAULT_PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// How a secret is rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKind {
    /// Carries a `password` field; regenerated as a random password.
    Password,
    /// Carries a `key` field; regenerated as a URL-safe random token.
    SymmetricKey,
    /// Carries an `api_key` field; rotated out of band only.
    ManualApiKey,
    /// None of the known fields.
    Unknown,
}

impl SecretKind {
    /// The field holding the rotated material, if the kind has one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Password => Some(FIELD_PASSWORD),
            Self::SymmetricKey => Some(FIELD_KEY),
            Self::ManualApiKey => Some(FIELD_API_KEY),
            Self::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::SymmetricKey => "symmetric_key",
            Self::ManualApiKey => "manual_api_key",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of asking the policy for a replacement value.
#[derive(Debug, PartialEq, Eq)]
pub enum Generation {
    /// Fresh material for `field`.
    Generated { field: &'static str, value: String },
    /// Externally managed credential; nothing to generate.
    ManualOnly,
    /// Shape not recognized; nothing to generate.
    Unsupported,
}

/// Result of validating a candidate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Passed(SecretKind),
    TooShort {
        field: &'static str,
        min_length: usize,
        actual_length: usize,
    },
}

impl Validation {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }
}

/// Tunable generation and validation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Length of generated passwords, in characters.
    pub password_length: usize,
    /// Symbols added to ASCII letters and digits for passwords.
    pub password_symbols: String,
    /// Random bytes behind each generated key token.
    pub key_entropy_bytes: usize,
    pub min_password_length: usize,
    pub min_key_length: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            password_length: 32,
            password_symbols: DEFAULT_PASSWORD_SYMBOLS.to_string(),
            key_entropy_bytes: 32,
            min_password_length: 8,
            min_key_length: 16,
        }
    }
}

/// Minimum entropy behind a generated key token.
pub const MIN_KEY_ENTROPY_BYTES: usize = 32;

/// Classification + generation + validation rules keyed to a secret's shape.
#[derive(Debug, Clone)]
pub struct SecretTypePolicy {
    config: PolicyConfig,
    alphabet: Vec<char>,
}

impl SecretTypePolicy {
    /// Build a policy, rejecting configs whose own output would fail
    /// validation.
    ///
    /// # Errors
    ///
    /// Returns `HookError::InvalidPolicy` describing the first violated rule.
    pub fn new(config: PolicyConfig) -> Result<Self> {
        if config.password_length < config.min_password_length {
            return Err(HookError::InvalidPolicy(format!(
                "password length {} is below the minimum {}",
                config.password_length, config.min_password_length
            )));
        }
        if config.key_entropy_bytes < MIN_KEY_ENTROPY_BYTES {
            return Err(HookError::InvalidPolicy(format!(
                "key entropy {} bytes is below {MIN_KEY_ENTROPY_BYTES}",
                config.key_entropy_bytes
            )));
        }
        if token_length(config.key_entropy_bytes) < config.min_key_length {
            return Err(HookError::InvalidPolicy(format!(
                "generated keys would be shorter than the minimum {}",
                config.min_key_length
            )));
        }
        if let Some(c) = config
            .password_symbols
            .chars()
            .find(|c| !c.is_ascii_punctuation())
        {
            return Err(HookError::InvalidPolicy(format!(
                "password symbol {c:?} is not ASCII punctuation"
            )));
        }

        let alphabet = build_alphabet(&config.password_symbols);
        Ok(Self { config, alphabet })
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Characters generated passwords are drawn from.
    pub fn password_alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Classify by field presence: `api_key > password > key > unknown`.
    pub fn classify(&self, value: &SecretValue) -> SecretKind {
        if value.contains(FIELD_API_KEY) {
            SecretKind::ManualApiKey
        } else if value.contains(FIELD_PASSWORD) {
            SecretKind::Password
        } else if value.contains(FIELD_KEY) {
            SecretKind::SymmetricKey
        } else {
            SecretKind::Unknown
        }
    }

    /// Produce replacement material for a secret of `kind`.
    pub fn generate(&self, kind: SecretKind) -> Generation {
        match kind {
            SecretKind::Password => Generation::Generated {
                field: FIELD_PASSWORD,
                value: random::random_string(&self.alphabet, self.config.password_length),
            },
            SecretKind::SymmetricKey => Generation::Generated {
                field: FIELD_KEY,
                value: random::urlsafe_token(self.config.key_entropy_bytes),
            },
            SecretKind::ManualApiKey => Generation::ManualOnly,
            SecretKind::Unknown => Generation::Unsupported,
        }
    }

    /// Check the classified field of `value` against its minimum length.
    pub fn validate(&self, value: &SecretValue) -> Validation {
        let kind = self.classify(value);
        let min_length = match kind {
            SecretKind::Password => self.config.min_password_length,
            SecretKind::SymmetricKey => self.config.min_key_length,
            SecretKind::ManualApiKey | SecretKind::Unknown => return Validation::Passed(kind),
        };

        // Password and SymmetricKey always carry a field.
        let field = kind.field().unwrap_or(FIELD_PASSWORD);
        let actual_length = value.get(field).map(|s| s.chars().count()).unwrap_or(0);
        if actual_length < min_length {
            Validation::TooShort {
                field,
                min_length,
                actual_length,
            }
        } else {
            Validation::Passed(kind)
        }
    }
}

impl Default for SecretTypePolicy {
    fn default() -> Self {
        let config = PolicyConfig::default();
        let alphabet = build_alphabet(&config.password_symbols);
        Self { config, alphabet }
    }
}

fn build_alphabet(symbols: &str) -> Vec<char> {
    let mut alphabet: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    for c in symbols.chars() {
        if !alphabet.contains(&c) {
            alphabet.push(c);
        }
    }
    alphabet
}

/// Length of an unpadded base64 encoding of `bytes` bytes.
fn token_length(bytes: usize) -> usize {
    (bytes * 4).div_ceil(3)
}
