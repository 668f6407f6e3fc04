//! Secret Store — versioned values with exclusive stage labels.
//!
//! The rotation core talks to the store only through [`SecretStore`].
//! Two implementations ship with the crate:
//!
//! - [`MemorySecretStore`] — a `Mutex`-guarded map, used by tests and
//!   dry runs.
//! - [`FileSecretStore`] — one JSON file per secret under a base directory.
//!
//! # Label rules
//!
//! Every label is held by at most one version. Writing a version with a
//! label, or moving a label, strips that label from whichever version held
//! it before. `PREVIOUS` can only be reached through a relabel, never
//! through a direct write.
//!
//! Unlabeled versions are pruned oldest-first once more than
//! [`UNLABELED_VERSION_RETENTION`] of them exist.

pub mod entry;
pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::secret::{SecretId, SecretValue, StageLabel, StoredVersion, VersionId};

pub use entry::{SecretEntry, UNLABELED_VERSION_RETENTION};
pub use file::FileSecretStore;
pub use memory::MemorySecretStore;

/// A single label change inside a [`LabelTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMove {
    /// The version holding `from` drops it and takes `to`.
    Relabel { from: StageLabel, to: StageLabel },
    /// Drop `label` from whichever version holds it.
    Remove(StageLabel),
}

/// An ordered list of label moves applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTransition {
    moves: Vec<LabelMove>,
}

impl LabelTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relabel(mut self, from: StageLabel, to: StageLabel) -> Self {
        self.moves.push(LabelMove::Relabel { from, to });
        self
    }

    pub fn remove(mut self, label: StageLabel) -> Self {
        self.moves.push(LabelMove::Remove(label));
        self
    }

    /// `CURRENT → PREVIOUS` followed by `PENDING → CURRENT`.
    pub fn promote_pending() -> Self {
        Self::new()
            .relabel(StageLabel::Current, StageLabel::Previous)
            .relabel(StageLabel::Pending, StageLabel::Current)
    }

    pub fn moves(&self) -> &[LabelMove] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Versioned key-value service with staged labels.
///
/// Implementations must make [`SecretStore::apply_transition`] atomic: either
/// every move commits or none does.
pub trait SecretStore {
    /// Create a secret whose first version is labeled `CURRENT`.
    ///
    /// # Errors
    ///
    /// `HookError::AlreadyExists` if the identifier is taken.
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId>;

    /// Fetch the version carrying `label` (`CURRENT` when `None`).
    ///
    /// # Errors
    ///
    /// `HookError::SecretNotFound` if the secret does not exist or no
    /// version carries the label.
    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion>;

    /// Store `value` as a new version tagged with exactly `label`.
    ///
    /// # Errors
    ///
    /// `HookError::SecretNotFound` for unknown secrets,
    /// `HookError::InvalidTransition` when `label` is `PREVIOUS`.
    fn put_version(&self, id: &SecretId, value: SecretValue, label: StageLabel)
        -> Result<VersionId>;

    /// Apply every move of `transition` or none of them.
    ///
    /// # Errors
    ///
    /// `HookError::InvalidTransition` if a move references a label nobody
    /// holds; the stored state is then unchanged.
    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()>;

    /// Map of every held label to its version.
    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>>;

    /// All versions, oldest first.
    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>>;

    /// Move `from` onto `to` on the version that holds `from`.
    fn promote_label(&self, id: &SecretId, from: StageLabel, to: StageLabel) -> Result<()> {
        self.apply_transition(id, &LabelTransition::new().relabel(from, to))
    }

    /// Replace `label` with `to` on the version that holds `label`.
    fn demote_label(&self, id: &SecretId, label: StageLabel, to: StageLabel) -> Result<()> {
        self.apply_transition(id, &LabelTransition::new().relabel(label, to))
    }
}

impl<S: SecretStore + ?Sized> SecretStore for &S {
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId> {
        (**self).create_secret(id, value)
    }

    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion> {
        (**self).get_version(id, label)
    }

    fn put_version(
        &self,
        id: &SecretId,
        value: SecretValue,
        label: StageLabel,
    ) -> Result<VersionId> {
        (**self).put_version(id, value, label)
    }

    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()> {
        (**self).apply_transition(id, transition)
    }

    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>> {
        (**self).describe_labels(id)
    }

    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>> {
        (**self).list_versions(id)
    }
}

impl<S: SecretStore + ?Sized> SecretStore for Arc<S> {
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId> {
        (**self).create_secret(id, value)
    }

    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion> {
        (**self).get_version(id, label)
    }

    fn put_version(
        &self,
        id: &SecretId,
        value: SecretValue,
        label: StageLabel,
    ) -> Result<VersionId> {
        (**self).put_version(id, value, label)
    }

    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()> {
        (**self).apply_transition(id, transition)
    }

    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>> {
        (**self).describe_labels(id)
    }

    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>> {
        (**self).list_versions(id)
    }
}

impl<S: SecretStore + ?Sized> SecretStore for Box<S> {
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId> {
        (**self).create_secret(id, value)
    }

    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion> {
        (**self).get_version(id, label)
    }

    fn put_version(
        &self,
        id: &SecretId,
        value: SecretValue,
        label: StageLabel,
    ) -> Result<VersionId> {
        (**self).put_version(id, value, label)
    }

    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()> {
        (**self).apply_transition(id, transition)
    }

    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>> {
        (**self).describe_labels(id)
    }

    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>> {
        (**self).list_versions(id)
    }
}
