//! Credential rotation — the four-step protocol.
//!
//! The Orchestrator issues `createSecret`, `setSecret`, `testSecret` and
//! `finishSecret` in order, once each per cycle, and may retry any of them.
//! [`RotationHandler`] executes one step per call; [`RotationEvent`] and
//! [`RotationResponse`] are the wire shapes of that call.

pub mod event;
pub mod handler;
pub mod step;

pub use event::{RotationEvent, RotationFailure, RotationResponse};
pub use handler::{RotationHandler, RotationOptions, CREATED_AT_FIELD};
pub use step::{StepKind, StepOutcome};
