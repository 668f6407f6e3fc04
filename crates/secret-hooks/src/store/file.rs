//! Filesystem-backed secret store.
//!
//! Each secret is stored as a single JSON file inside the configured base
//! directory. The file name is derived from a fingerprint of the secret
//! identifier, since ARN-style identifiers contain `/` and `:`.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "secret": { "id": "...", "versions": [ ... StoredVersion ... ] }
//! }
//! ```
//!
//! Writes go to a temporary file that is then renamed over the secret file,
//! so a label transition is either fully on disk or not at all.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::crypto::fingerprint::fingerprint;
use crate::error::{HookError, Result};
use crate::secret::{SecretId, SecretValue, StageLabel, StoredVersion, VersionId};

use super::{LabelTransition, SecretEntry, SecretStore};

// ── File format constants ─────────────────────────────────────────────────────

const SECRET_FILE_VERSION: u32 = 1;
const SECRET_FILE_PREFIX: &str = "secret_";

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each secret.
#[derive(Debug, Serialize, Deserialize)]
struct SecretFile {
    /// Format version number.
    version: u32,
    /// The stored secret.
    secret: SecretEntry,
}

// ── FileSecretStore ───────────────────────────────────────────────────────────

/// Filesystem-backed store for secrets and their versions.
///
/// Read-modify-write cycles are serialized within the process; concurrent
/// writers in other processes are not coordinated.
#[derive(Debug)]
pub struct FileSecretStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    /// Create a new `FileSecretStore` rooted at `base_dir`.
    ///
    /// The directory and any missing parents are created if they do not exist.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Identifiers of all stored secrets, sorted.
    pub fn list_secrets(&self) -> Result<Vec<SecretId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if name_str.starts_with(SECRET_FILE_PREFIX) && name_str.ends_with(".json") {
                ids.push(self.read_path(&entry.path())?.id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn secret_path(&self, id: &SecretId) -> PathBuf {
        self.base_dir.join(format!(
            "{SECRET_FILE_PREFIX}{}.json",
            fingerprint(id.as_str().as_bytes())
        ))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| HookError::StoreUnavailable("secret store lock poisoned".into()))
    }

    fn read_path(&self, path: &Path) -> Result<SecretEntry> {
        let bytes = std::fs::read(path)?;
        let file: SecretFile = serde_json::from_slice(&bytes).map_err(|e| {
            HookError::InvalidFileFormat(format!(
                "failed to parse secret file {}: {e}",
                path.display()
            ))
        })?;

        if file.version != SECRET_FILE_VERSION {
            return Err(HookError::InvalidFileFormat(format!(
                "unsupported secret file version {} in {}",
                file.version,
                path.display()
            )));
        }

        Ok(file.secret)
    }

    fn read(&self, id: &SecretId) -> Result<SecretEntry> {
        let path = self.secret_path(id);
        if !path.exists() {
            return Err(HookError::SecretNotFound(id.to_string()));
        }
        let entry = self.read_path(&path)?;
        if &entry.id != id {
            return Err(HookError::InvalidFileFormat(format!(
                "{} holds {} instead of {id}",
                path.display(),
                entry.id
            )));
        }
        Ok(entry)
    }

    fn write(&self, entry: &SecretEntry) -> Result<()> {
        let file = SecretFile {
            version: SECRET_FILE_VERSION,
            secret: entry.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| HookError::SerializationError(e.to_string()))?;

        let path = self.secret_path(&entry.id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &path)?;

        Ok(())
    }

    fn modify<T>(&self, id: &SecretId, f: impl FnOnce(&mut SecretEntry) -> Result<T>) -> Result<T> {
        let _guard = self.lock()?;
        let mut entry = self.read(id)?;
        let out = f(&mut entry)?;
        self.write(&entry)?;
        Ok(out)
    }
}

impl SecretStore for FileSecretStore {
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId> {
        let _guard = self.lock()?;
        if self.secret_path(id).exists() {
            return Err(HookError::AlreadyExists(id.to_string()));
        }
        let (entry, version_id) = SecretEntry::new(id.clone(), value, crate::time::now_micros());
        self.write(&entry)?;
        Ok(version_id)
    }

    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion> {
        let label = label.unwrap_or(StageLabel::Current);
        let entry = self.read(id)?;
        entry.holder(label).cloned().ok_or_else(|| {
            HookError::SecretNotFound(format!("{id} has no version labeled {label}"))
        })
    }

    fn put_version(
        &self,
        id: &SecretId,
        value: SecretValue,
        label: StageLabel,
    ) -> Result<VersionId> {
        self.modify(id, |entry| {
            entry.push_version(value, label, crate::time::now_micros())
        })
    }

    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()> {
        self.modify(id, |entry| entry.apply(transition))
    }

    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>> {
        Ok(self.read(id)?.describe_labels())
    }

    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>> {
        Ok(self.read(id)?.versions)
    }
}
