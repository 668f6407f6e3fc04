//! Identity lifecycle triggers.
//!
//! The identity directory calls one handler per lifecycle point and uses
//! the returned event. Handlers differ in how a failure is treated:
//!
//! - pre-signup and pre-authentication validation failures propagate, which
//!   blocks account creation or sign-in;
//! - every other failure is logged and the original event is returned, so
//!   the directory's own lifecycle is never blocked by bookkeeping.
//!
//! [`IdentityTriggers::dispatch`] applies that rule from each handler's
//! `Result`.

pub mod custom_message;
pub mod event;
pub mod post_authentication;
pub mod post_confirmation;
pub mod pre_authentication;
pub mod pre_signup;
pub mod records;

use std::str::FromStr;

use serde_json::{json, Value};

use crate::error::{HookError, Result};

pub use event::{TriggerEvent, TriggerRequest};
pub use records::{FileRecordStore, MemoryRecordStore, RecordStore};

/// Attribute holding the accepted consent version.
pub const ATTR_CONSENT_VERSION: &str = "custom:consent_version";
/// Attribute holding the JSON-encoded user preferences.
pub const ATTR_USER_PREFERENCES: &str = "custom:user_preferences";
pub const DEFAULT_CONSENT_VERSION: &str = "1.0";

/// Preferences assigned to new users.
pub fn default_preferences() -> Value {
    json!({
        "personas_enabled": ["courage", "comfort", "creative", "compass"],
        "session_reminders": true,
        "data_retention_days": 30,
        "privacy_mode": "standard"
    })
}

/// Parse the preferences attribute, if present and valid JSON.
pub(crate) fn parse_preferences(event: &TriggerEvent) -> Option<Value> {
    event
        .attribute(ATTR_USER_PREFERENCES)
        .and_then(|raw| serde_json::from_str(raw).ok())
}

/// Lifecycle point a handler is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    PreSignUp,
    PostConfirmation,
    PreAuthentication,
    PostAuthentication,
    CustomMessage,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 5] = [
        Self::PreSignUp,
        Self::PostConfirmation,
        Self::PreAuthentication,
        Self::PostAuthentication,
        Self::CustomMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreSignUp => "pre-signup",
            Self::PostConfirmation => "post-confirmation",
            Self::PreAuthentication => "pre-authentication",
            Self::PostAuthentication => "post-authentication",
            Self::CustomMessage => "custom-message",
        }
    }

    /// Whether a handler failure must reach the directory.
    pub fn blocks_on_failure(&self) -> bool {
        matches!(self, Self::PreSignUp | Self::PreAuthentication)
    }

    /// Infer the kind from a directory trigger source such as
    /// `PreSignUp_ExternalProvider` or `CustomMessage_ForgotPassword`.
    pub fn from_trigger_source(source: &str) -> Option<Self> {
        let prefix = source.split('_').next().unwrap_or("");
        match prefix {
            "PreSignUp" => Some(Self::PreSignUp),
            "PostConfirmation" => Some(Self::PostConfirmation),
            "PreAuthentication" => Some(Self::PreAuthentication),
            "PostAuthentication" => Some(Self::PostAuthentication),
            "CustomMessage" => Some(Self::CustomMessage),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| HookError::UnknownTrigger(s.to_string()))
    }
}

/// Deployment naming shared by all triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    pub project_name: String,
    pub environment: String,
    /// Name used in message templates.
    pub product_name: String,
    pub support_email: String,
}

impl TriggerContext {
    /// `{project}-{suffix}` collection name.
    pub fn collection(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.project_name)
    }
}

impl Default for TriggerContext {
    fn default() -> Self {
        Self {
            project_name: "innerworld".into(),
            environment: "unknown".into(),
            product_name: "InnerWorld".into(),
            support_email: "support@innerworld.app".into(),
        }
    }
}

/// Trigger dispatcher over a record store.
#[derive(Debug)]
pub struct IdentityTriggers<R> {
    records: R,
    context: TriggerContext,
}

impl<R: RecordStore> IdentityTriggers<R> {
    pub fn new(records: R, context: TriggerContext) -> Self {
        Self { records, context }
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn context(&self) -> &TriggerContext {
        &self.context
    }

    /// Run the handler for `kind` and apply the failure policy.
    ///
    /// # Errors
    ///
    /// Only pre-signup and pre-authentication failures are returned; all
    /// other failures yield `Ok` with the event as it was passed in.
    pub fn dispatch(&self, kind: TriggerKind, event: TriggerEvent) -> Result<TriggerEvent> {
        let original = event.clone();
        let result = match kind {
            TriggerKind::PreSignUp => pre_signup::handle(event),
            TriggerKind::PostConfirmation => {
                post_confirmation::handle(&self.records, &self.context, event)
            }
            TriggerKind::PreAuthentication => pre_authentication::handle(&self.context, event),
            TriggerKind::PostAuthentication => {
                post_authentication::handle(&self.records, &self.context, event)
            }
            TriggerKind::CustomMessage => custom_message::handle(&self.context, event),
        };

        match result {
            Ok(event) => Ok(event),
            Err(e) if kind.blocks_on_failure() => {
                log::error!(
                    "{kind} failed for user {}: {e}",
                    display_user(&original.user_name)
                );
                Err(e)
            }
            Err(e) => {
                log::error!(
                    "{kind} processing failed for user {}: {e}",
                    display_user(&original.user_name)
                );
                Ok(original)
            }
        }
    }

    /// Dispatch on the kind implied by the event's trigger source.
    pub fn dispatch_by_source(&self, event: TriggerEvent) -> Result<TriggerEvent> {
        let kind = TriggerKind::from_trigger_source(&event.trigger_source)
            .ok_or_else(|| HookError::UnknownTrigger(event.trigger_source.clone()))?;
        self.dispatch(kind, event)
    }
}

fn display_user(user_name: &str) -> &str {
    if user_name.is_empty() {
        "unknown"
    } else {
        user_name
    }
}
