//! In-memory representation of one secret and its label bookkeeping.
//!
//! Both shipped stores load a [`SecretEntry`], mutate it through the methods
//! here and then commit it as a whole, so the label rules live in one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HookError, Result};
use crate::secret::{SecretId, SecretValue, StageLabel, StoredVersion, VersionId};

use super::{LabelMove, LabelTransition};

/// Unlabeled versions kept after each write; older ones are dropped.
pub const UNLABELED_VERSION_RETENTION: usize = 10;

/// A secret with all of its versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretEntry {
    pub id: SecretId,
    /// Versions in creation order.
    pub versions: Vec<StoredVersion>,
}

impl SecretEntry {
    /// New secret whose only version is labeled `CURRENT`.
    pub fn new(id: SecretId, value: SecretValue, created_at: u64) -> (Self, VersionId) {
        let version_id = VersionId::generate();
        let version = StoredVersion {
            version_id: version_id.clone(),
            value,
            labels: [StageLabel::Current].into_iter().collect(),
            created_at,
        };
        (
            Self {
                id,
                versions: vec![version],
            },
            version_id,
        )
    }

    /// Version currently holding `label`.
    pub fn holder(&self, label: StageLabel) -> Option<&StoredVersion> {
        self.versions.iter().find(|v| v.has_label(label))
    }

    /// Map of held labels to version identifiers.
    pub fn describe_labels(&self) -> BTreeMap<StageLabel, VersionId> {
        let mut labels = BTreeMap::new();
        for version in &self.versions {
            for label in &version.labels {
                labels.insert(*label, version.version_id.clone());
            }
        }
        labels
    }

    /// Append a version tagged with `label`, taking the label from any
    /// other holder.
    pub fn push_version(
        &mut self,
        value: SecretValue,
        label: StageLabel,
        created_at: u64,
    ) -> Result<VersionId> {
        if label == StageLabel::Previous {
            return Err(HookError::InvalidTransition(format!(
                "{} can only be assigned by promotion",
                StageLabel::Previous
            )));
        }

        self.strip(label);
        let version_id = VersionId::generate();
        self.versions.push(StoredVersion {
            version_id: version_id.clone(),
            value,
            labels: [label].into_iter().collect(),
            created_at,
        });
        self.prune();
        Ok(version_id)
    }

    /// Apply `transition` to a scratch copy and commit only if every move
    /// succeeded.
    pub fn apply(&mut self, transition: &LabelTransition) -> Result<()> {
        let mut scratch = self.versions.clone();
        for mv in transition.moves() {
            apply_move(&mut scratch, *mv, &self.id)?;
        }
        self.versions = scratch;
        self.prune();
        Ok(())
    }

    /// Drop the oldest unlabeled versions beyond
    /// [`UNLABELED_VERSION_RETENTION`]. Labeled versions are never dropped.
    pub fn prune(&mut self) {
        let unlabeled = self.versions.iter().filter(|v| v.labels.is_empty()).count();
        let mut excess = unlabeled.saturating_sub(UNLABELED_VERSION_RETENTION);
        if excess == 0 {
            return;
        }
        self.versions.retain(|v| {
            if excess > 0 && v.labels.is_empty() {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    fn strip(&mut self, label: StageLabel) {
        for version in &mut self.versions {
            version.labels.remove(&label);
        }
    }
}

fn apply_move(versions: &mut [StoredVersion], mv: LabelMove, id: &SecretId) -> Result<()> {
    match mv {
        LabelMove::Relabel { from, to } => {
            let idx = versions
                .iter()
                .position(|v| v.has_label(from))
                .ok_or_else(|| {
                    HookError::InvalidTransition(format!("no version of {id} holds {from}"))
                })?;
            for version in versions.iter_mut() {
                version.labels.remove(&to);
            }
            versions[idx].labels.remove(&from);
            versions[idx].labels.insert(to);
        }
        LabelMove::Remove(label) => {
            let holder = versions
                .iter_mut()
                .find(|v| v.has_label(label))
                .ok_or_else(|| {
                    HookError::InvalidTransition(format!("no version of {id} holds {label}"))
                })?;
            holder.labels.remove(&label);
        }
    }
    Ok(())
}
