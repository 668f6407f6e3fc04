//! Error types for secret-hooks.
//!
//! All errors are strongly typed and propagated without panicking.
//! Secret values are never included in error messages.

/// Error types covering rotation steps, secret stores and identity triggers.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("SecretId not provided in event")]
    MissingSecretId,

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Secret validation failed for {secret_id}: {reason}")]
    SecretValidationFailed { secret_id: String, reason: String },

    #[error("Secret shape not recognized for {0}; generation unsupported")]
    GenerationUnsupported(String),

    #[error("No pending version staged for {0}")]
    NoPendingVersion(String),

    #[error("Secret already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid label transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid stage label: {0}")]
    InvalidStageLabel(String),

    #[error("Secret store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Identity trigger validation failed: {0}")]
    IdentityTriggerValidationFailed(String),

    #[error("Malformed trigger event: {0}")]
    MalformedTriggerEvent(String),

    #[error("Unknown trigger: {0}")]
    UnknownTrigger(String),

    #[error("Record store error: {0}")]
    RecordStore(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HookError {
    /// Stable snake-case name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SecretNotFound(_) => "secret_not_found",
            Self::MissingSecretId => "missing_secret_id",
            Self::UnknownStep(_) => "unknown_step",
            Self::SecretValidationFailed { .. } => "secret_validation_failed",
            Self::GenerationUnsupported(_) => "generation_unsupported",
            Self::NoPendingVersion(_) => "no_pending_version",
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::InvalidStageLabel(_) => "invalid_stage_label",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::InvalidPolicy(_) => "invalid_policy",
            Self::IdentityTriggerValidationFailed(_) => "identity_trigger_validation_failed",
            Self::MalformedTriggerEvent(_) => "malformed_trigger_event",
            Self::UnknownTrigger(_) => "unknown_trigger",
            Self::RecordStore(_) => "record_store",
            Self::SerializationError(_) => "serialization_error",
            Self::InvalidFileFormat(_) => "invalid_file_format",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Io(_) => "io",
        }
    }

    /// HTTP-style status reported to the Orchestrator.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingSecretId | Self::UnknownStep(_) | Self::SerializationError(_) => 400,
            Self::SecretNotFound(_) | Self::NoPendingVersion(_) => 404,
            Self::SecretValidationFailed { .. } | Self::GenerationUnsupported(_) => 422,
            Self::StoreUnavailable(_) => 503,
            _ => 500,
        }
    }

    /// Whether the Orchestrator may retry the same step unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Io(_))
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, HookError>;
