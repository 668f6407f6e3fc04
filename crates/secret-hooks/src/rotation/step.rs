//! Rotation steps and their outcomes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::policy::SecretKind;
use crate::secret::VersionId;

/// One of the four steps of a rotation cycle, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    #[serde(rename = "createSecret")]
    CreateSecret,
    #[serde(rename = "setSecret")]
    SetSecret,
    #[serde(rename = "testSecret")]
    TestSecret,
    #[serde(rename = "finishSecret")]
    FinishSecret,
}

impl StepKind {
    /// All steps in the order the Orchestrator issues them.
    pub const CYCLE: [StepKind; 4] = [
        Self::CreateSecret,
        Self::SetSecret,
        Self::TestSecret,
        Self::FinishSecret,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateSecret => "createSecret",
            Self::SetSecret => "setSecret",
            Self::TestSecret => "testSecret",
            Self::FinishSecret => "finishSecret",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = HookError;

    /// Step names are matched exactly.
    fn from_str(s: &str) -> Result<Self, HookError> {
        match s {
            "createSecret" => Ok(Self::CreateSecret),
            "setSecret" => Ok(Self::SetSecret),
            "testSecret" => Ok(Self::TestSecret),
            "finishSecret" => Ok(Self::FinishSecret),
            other => Err(HookError::UnknownStep(other.to_string())),
        }
    }
}

/// What a successful step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// `createSecret` wrote a new `PENDING` version.
    Created { version_id: VersionId, kind: SecretKind },
    /// `createSecret` found a `PENDING` version already staged.
    AlreadyPending { version_id: VersionId },
    /// `createSecret` skipped an externally managed credential.
    ManualRotation,
    /// `createSecret` skipped a secret whose shape is not recognized.
    Unsupported,
    /// `setSecret` has nothing to push downstream.
    NoOp,
    /// `testSecret` accepted the `PENDING` value.
    Validated { kind: SecretKind },
    /// `finishSecret` moved `PENDING` to `CURRENT`.
    Promoted {
        current: VersionId,
        previous: Option<VersionId>,
    },
    /// `finishSecret` found `PENDING` already on the `CURRENT` version.
    AlreadyCurrent { current: VersionId },
}

impl StepOutcome {
    /// Whether the step changed any stored state.
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Promoted { .. } | Self::AlreadyCurrent { .. }
        )
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created { version_id, kind } => {
                write!(f, "created pending {kind} version {version_id}")
            }
            Self::AlreadyPending { version_id } => {
                write!(f, "pending version {version_id} already staged")
            }
            Self::ManualRotation => f.write_str("API key detected - manual rotation required"),
            Self::Unsupported => f.write_str("unknown secret type - nothing generated"),
            Self::NoOp => f.write_str("no action needed"),
            Self::Validated { kind } => write!(f, "{kind} validation passed"),
            Self::Promoted {
                current,
                previous: Some(previous),
            } => write!(f, "{current} is current, {previous} is previous"),
            Self::Promoted {
                current,
                previous: None,
            } => write!(f, "{current} is current"),
            Self::AlreadyCurrent { current } => {
                write!(f, "{current} already current, pending label cleared")
            }
        }
    }
}
