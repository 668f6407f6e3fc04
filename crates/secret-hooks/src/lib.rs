//! secret-hooks: credential rotation and identity lifecycle hooks.
//!
//! Provides the four-step rotation protocol (create, set, test, finish)
//! over a versioned secret store with `AWSCURRENT` / `AWSPENDING` /
//! `AWSPREVIOUS` stage labels, a Secret Type Policy that decides how each
//! secret shape is regenerated and validated, and the identity-directory
//! trigger handlers run at sign-up, confirmation, sign-in and messaging
//! time.

pub mod config;
pub mod crypto;
pub mod error;
pub mod policy;
pub mod rotation;
pub mod secret;
pub mod store;
pub mod time;
pub mod triggers;

// Re-export primary types
pub use config::HooksConfig;
pub use error::{HookError, Result};
pub use secret::{SecretId, SecretValue, StageLabel, StoredVersion, VersionId};

// Re-export store types
pub use store::{
    FileSecretStore, LabelMove, LabelTransition, MemorySecretStore, SecretEntry, SecretStore,
    UNLABELED_VERSION_RETENTION,
};

// Re-export policy types
pub use policy::{Generation, PolicyConfig, SecretKind, SecretTypePolicy, Validation};

// Re-export rotation types
pub use rotation::{
    RotationEvent, RotationFailure, RotationHandler, RotationOptions, RotationResponse, StepKind,
    StepOutcome,
};

// Re-export trigger types
pub use triggers::{
    FileRecordStore, IdentityTriggers, MemoryRecordStore, RecordStore, TriggerContext,
    TriggerEvent, TriggerKind,
};
