//! Secret data model — identifiers, stage labels, versioned values.
//!
//! A secret owns an unordered set of versions. Each version carries an
//! immutable value (field name → string) and zero or more stage labels.
//! The labels encode the whole rotation state; nothing else is persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::{fingerprint, random};
use crate::error::{HookError, Result};

/// Opaque secret identifier (ARN-equivalent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecretId(pub String);

impl SecretId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecretId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned version identifier.
///
/// Format: `sv_` + base58 of 16 random bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl VersionId {
    /// Allocate a fresh version identifier.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = random::random_bytes();
        Self(format!("sv_{}", bs58::encode(bytes).into_string()))
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a version in the rotation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageLabel {
    /// The authoritative, in-use value.
    #[serde(rename = "AWSCURRENT")]
    Current,
    /// Candidate produced by the running rotation cycle.
    #[serde(rename = "AWSPENDING")]
    Pending,
    /// Value replaced by the last promotion, kept for rollback.
    #[serde(rename = "AWSPREVIOUS")]
    Previous,
}

impl StageLabel {
    pub const ALL: [StageLabel; 3] = [Self::Current, Self::Pending, Self::Previous];

    /// Wire name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "AWSCURRENT",
            Self::Pending => "AWSPENDING",
            Self::Previous => "AWSPREVIOUS",
        }
    }
}

impl std::fmt::Display for StageLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageLabel {
    type Err = HookError;

    /// Accepts the wire names and the bare names, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("AWS").unwrap_or(upper.as_str()) {
            "CURRENT" => Ok(Self::Current),
            "PENDING" => Ok(Self::Pending),
            "PREVIOUS" => Ok(Self::Previous),
            _ => Err(HookError::InvalidStageLabel(s.to_string())),
        }
    }
}

/// A secret value: field name → string.
///
/// Field contents are zeroized on drop and never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(BTreeMap<String, String>);

impl SecretValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field, zeroizing the replaced content.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        if let Some(mut old) = self.0.insert(field.into(), value.into()) {
            old.zeroize();
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Field names in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON object of string fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HookError::SerializationError(e.to_string()))
    }

    /// Serialize as a compact JSON object.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| HookError::SerializationError(e.to_string()))
    }

    /// Fingerprint of the whole value, for logs.
    pub fn fingerprint(&self) -> String {
        let mut material = String::new();
        for (field, value) in &self.0 {
            material.push_str(field);
            material.push('\0');
            material.push_str(value);
            material.push('\0');
        }
        let fp = fingerprint::fingerprint(material.as_bytes());
        material.zeroize();
        fp
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValue")
            .field("fields", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for SecretValue {
    fn drop(&mut self) {
        for value in self.0.values_mut() {
            value.zeroize();
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut value = Self::new();
        for (k, v) in iter {
            value.insert(k, v);
        }
        value
    }
}

/// One stored version of a secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVersion {
    pub version_id: VersionId,
    pub value: SecretValue,
    pub labels: BTreeSet<StageLabel>,
    /// Creation time (microseconds since Unix epoch).
    pub created_at: u64,
}

impl StoredVersion {
    pub fn has_label(&self, label: StageLabel) -> bool {
        self.labels.contains(&label)
    }
}
