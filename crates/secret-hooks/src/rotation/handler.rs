//! Rotation Step Handler — the four-step state machine.
//!
//! Every step is re-entrant. The only state is the store's stage labels,
//! so a step that crashed half way can be issued again:
//!
//! | Step           | Reads                        | Writes                                        |
//! |----------------|------------------------------|-----------------------------------------------|
//! | `createSecret` | labels, `PENDING`, `CURRENT` | new `PENDING` unless a valid one is staged    |
//! | `setSecret`    | labels                       | nothing                                       |
//! | `testSecret`   | labels, `PENDING`            | nothing                                       |
//! | `finishSecret` | labels                       | `CURRENT→PREVIOUS`, `PENDING→CURRENT`         |

use crate::error::{HookError, Result};
use crate::policy::{Generation, SecretTypePolicy, Validation};
use crate::secret::{SecretId, StageLabel};
use crate::store::{LabelTransition, SecretStore};

use super::step::{StepKind, StepOutcome};

/// Field stamped with the creation time of each generated version.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Behavior switches for [`RotationHandler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationOptions {
    /// Fail `createSecret` with `GenerationUnsupported` for unrecognized
    /// shapes instead of skipping them.
    pub reject_unknown_shapes: bool,
}

/// Executes rotation steps against a store using a type policy.
///
/// Both collaborators are injected; the handler holds no other state.
#[derive(Debug)]
pub struct RotationHandler<S> {
    store: S,
    policy: SecretTypePolicy,
    options: RotationOptions,
}

impl<S: SecretStore> RotationHandler<S> {
    pub fn new(store: S, policy: SecretTypePolicy) -> Self {
        Self {
            store,
            policy,
            options: RotationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RotationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &SecretTypePolicy {
        &self.policy
    }

    /// Validate raw inputs, then run the named step.
    ///
    /// An empty `secret_id` or an unknown `step` is rejected before the
    /// store is touched.
    pub fn execute(&self, secret_id: &str, step: &str) -> Result<StepOutcome> {
        if secret_id.trim().is_empty() {
            return Err(HookError::MissingSecretId);
        }
        let step: StepKind = step.parse()?;
        self.execute_step(&SecretId::new(secret_id), step)
    }

    /// Run one step of the rotation cycle for `secret_id`.
    pub fn execute_step(&self, secret_id: &SecretId, step: StepKind) -> Result<StepOutcome> {
        log::info!("Processing step: {step} for secret: {secret_id}");

        let result = match step {
            StepKind::CreateSecret => self.create_secret(secret_id),
            StepKind::SetSecret => self.set_secret(secret_id),
            StepKind::TestSecret => self.test_secret(secret_id),
            StepKind::FinishSecret => self.finish_secret(secret_id),
        };

        match &result {
            Ok(outcome) => log::info!("Successfully completed step: {step} ({outcome})"),
            Err(e) => log::error!("Step {step} failed for secret {secret_id}: {e}"),
        }
        result
    }

    fn create_secret(&self, secret_id: &SecretId) -> Result<StepOutcome> {
        let labels = self.store.describe_labels(secret_id)?;
        if labels.contains_key(&StageLabel::Pending) {
            let pending = self.store.get_version(secret_id, Some(StageLabel::Pending))?;
            match self.policy.validate(&pending.value) {
                Validation::Passed(_) => {
                    log::info!(
                        "Pending version {} already staged for {secret_id}; skipping generation",
                        pending.version_id
                    );
                    return Ok(StepOutcome::AlreadyPending {
                        version_id: pending.version_id,
                    });
                }
                // A stale pending from an abandoned cycle is replaced below.
                Validation::TooShort { field, .. } => log::warn!(
                    "Pending version {} of {secret_id} fails {field} validation; replacing it",
                    pending.version_id
                ),
            }
        }

        let current = self.store.get_version(secret_id, Some(StageLabel::Current))?;
        let kind = self.policy.classify(&current.value);

        let (field, material) = match self.policy.generate(kind) {
            Generation::Generated { field, value } => (field, value),
            Generation::ManualOnly => {
                log::info!("API key detected for {secret_id} - manual rotation required");
                return Ok(StepOutcome::ManualRotation);
            }
            Generation::Unsupported => {
                if self.options.reject_unknown_shapes {
                    return Err(HookError::GenerationUnsupported(secret_id.to_string()));
                }
                log::warn!("Unknown secret type for {secret_id}");
                return Ok(StepOutcome::Unsupported);
            }
        };

        let mut next = current.value.clone();
        next.insert(field, material);
        next.insert(CREATED_AT_FIELD, crate::time::now_rfc3339());
        let fingerprint = next.fingerprint();

        let version_id = self
            .store
            .put_version(secret_id, next, StageLabel::Pending)?;

        log::info!(
            "Created new {kind} version {version_id} for {secret_id} (fingerprint {fingerprint})"
        );
        Ok(StepOutcome::Created { version_id, kind })
    }

    fn set_secret(&self, secret_id: &SecretId) -> Result<StepOutcome> {
        self.store.describe_labels(secret_id)?;
        log::info!("Set secret step - no action needed for {secret_id}");
        Ok(StepOutcome::NoOp)
    }

    fn test_secret(&self, secret_id: &SecretId) -> Result<StepOutcome> {
        let labels = self.store.describe_labels(secret_id)?;
        if !labels.contains_key(&StageLabel::Pending) {
            return Err(HookError::NoPendingVersion(secret_id.to_string()));
        }

        let pending = self.store.get_version(secret_id, Some(StageLabel::Pending))?;
        match self.policy.validate(&pending.value) {
            Validation::Passed(kind) => {
                log::info!("Secret validation passed for {secret_id} ({kind})");
                Ok(StepOutcome::Validated { kind })
            }
            Validation::TooShort {
                field,
                min_length,
                actual_length,
            } => Err(HookError::SecretValidationFailed {
                secret_id: secret_id.to_string(),
                reason: format!("{field} too short: {actual_length} < {min_length}"),
            }),
        }
    }

    fn finish_secret(&self, secret_id: &SecretId) -> Result<StepOutcome> {
        let labels = self.store.describe_labels(secret_id)?;
        let pending = labels
            .get(&StageLabel::Pending)
            .cloned()
            .ok_or_else(|| HookError::NoPendingVersion(secret_id.to_string()))?;
        let current = labels.get(&StageLabel::Current).cloned();

        if current.as_ref() == Some(&pending) {
            self.store
                .apply_transition(secret_id, &LabelTransition::new().remove(StageLabel::Pending))?;
            log::info!("Version {pending} of {secret_id} was already current");
            return Ok(StepOutcome::AlreadyCurrent { current: pending });
        }

        let transition = if current.is_some() {
            LabelTransition::promote_pending()
        } else {
            LabelTransition::new().relabel(StageLabel::Pending, StageLabel::Current)
        };
        self.store.apply_transition(secret_id, &transition)?;

        log::info!("Successfully finished secret rotation for {secret_id}");
        Ok(StepOutcome::Promoted {
            current: pending,
            previous: current,
        })
    }
}
