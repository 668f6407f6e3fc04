//! Rotation invocation contract.
//!
//! The Orchestrator sends `{"SecretId": "...", "Step": "..."}` and receives
//! either `{"success": true, "message": "...", "secretId": "..."}` or
//! `{"success": false, "error": {"kind": "...", ...}, "secretId": "..."}`.

use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::store::SecretStore;

use super::handler::RotationHandler;
use super::step::StepKind;

/// Placeholder echoed back when the event carried no usable identifier.
pub const UNKNOWN_SECRET_ID: &str = "unknown";

fn default_step() -> String {
    StepKind::CreateSecret.as_str().to_string()
}

/// One step invocation from the Orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationEvent {
    #[serde(rename = "SecretId", default)]
    pub secret_id: String,
    /// Defaults to `createSecret` when absent.
    #[serde(rename = "Step", default = "default_step")]
    pub step: String,
}

impl RotationEvent {
    pub fn new(secret_id: impl Into<String>, step: StepKind) -> Self {
        Self {
            secret_id: secret_id.into(),
            step: step.as_str().to_string(),
        }
    }
}

/// Structured failure returned to the Orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationFailure {
    pub kind: String,
    pub message: String,
    /// HTTP-style status derived from the error variant.
    pub status: u16,
    /// Whether re-issuing the same step may succeed.
    pub retryable: bool,
}

impl From<&HookError> for RotationFailure {
    fn from(e: &HookError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
            status: e.status_code(),
            retryable: e.is_retryable(),
        }
    }
}

/// Reply to a [`RotationEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RotationFailure>,
    pub secret_id: String,
}

impl RotationResponse {
    pub fn ok(secret_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            secret_id: secret_id.into(),
        }
    }

    pub fn failed(secret_id: impl Into<String>, error: &HookError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(RotationFailure::from(error)),
            secret_id: secret_id.into(),
        }
    }

    /// HTTP-style status for the response.
    pub fn status_code(&self) -> u16 {
        self.error.as_ref().map_or(200, |e| e.status)
    }
}

impl<S: SecretStore> RotationHandler<S> {
    /// Run the step named by `event` and shape the reply.
    pub fn handle(&self, event: &RotationEvent) -> RotationResponse {
        let echoed = if event.secret_id.trim().is_empty() {
            UNKNOWN_SECRET_ID
        } else {
            event.secret_id.as_str()
        };

        match self.execute(&event.secret_id, &event.step) {
            Ok(outcome) => RotationResponse::ok(
                echoed,
                format!(
                    "Successfully completed {} for secret rotation: {outcome}",
                    event.step
                ),
            ),
            Err(e) => {
                log::error!("Error in secret rotation: {e}");
                RotationResponse::failed(echoed, &e)
            }
        }
    }

    /// Parse a JSON event and handle it.
    pub fn handle_json(&self, json: &str) -> RotationResponse {
        match serde_json::from_str::<RotationEvent>(json) {
            Ok(event) => self.handle(&event),
            Err(e) => {
                let err = HookError::SerializationError(e.to_string());
                log::error!("Error in secret rotation: {err}");
                RotationResponse::failed(UNKNOWN_SECRET_ID, &err)
            }
        }
    }
}
