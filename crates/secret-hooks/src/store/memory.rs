//! In-memory secret store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::{HookError, Result};
use crate::secret::{SecretId, SecretValue, StageLabel, StoredVersion, VersionId};

use super::{LabelTransition, SecretEntry, SecretStore};

/// `Mutex`-guarded map of secrets.
///
/// Every operation holds the lock for its whole read-modify-write, so a
/// label transition is observed either entirely or not at all.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<SecretId, SecretEntry>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of secrets held.
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace a whole secret, e.g. when importing from another
    /// store.
    pub fn import(&self, entry: SecretEntry) -> Result<()> {
        self.lock()?.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SecretId, SecretEntry>>> {
        self.secrets
            .lock()
            .map_err(|_| HookError::StoreUnavailable("secret store lock poisoned".into()))
    }

    fn with_entry<T>(
        &self,
        id: &SecretId,
        f: impl FnOnce(&mut SecretEntry) -> Result<T>,
    ) -> Result<T> {
        let mut secrets = self.lock()?;
        let entry = secrets
            .get_mut(id)
            .ok_or_else(|| HookError::SecretNotFound(id.to_string()))?;
        f(entry)
    }
}

impl SecretStore for MemorySecretStore {
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId> {
        let mut secrets = self.lock()?;
        if secrets.contains_key(id) {
            return Err(HookError::AlreadyExists(id.to_string()));
        }
        let (entry, version_id) = SecretEntry::new(id.clone(), value, crate::time::now_micros());
        secrets.insert(id.clone(), entry);
        Ok(version_id)
    }

    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion> {
        let label = label.unwrap_or(StageLabel::Current);
        self.with_entry(id, |entry| {
            entry.holder(label).cloned().ok_or_else(|| {
                HookError::SecretNotFound(format!("{id} has no version labeled {label}"))
            })
        })
    }

    fn put_version(
        &self,
        id: &SecretId,
        value: SecretValue,
        label: StageLabel,
    ) -> Result<VersionId> {
        self.with_entry(id, |entry| {
            entry.push_version(value, label, crate::time::now_micros())
        })
    }

    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()> {
        self.with_entry(id, |entry| entry.apply(transition))
    }

    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>> {
        self.with_entry(id, |entry| Ok(entry.describe_labels()))
    }

    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>> {
        self.with_entry(id, |entry| Ok(entry.versions.clone()))
    }
}
