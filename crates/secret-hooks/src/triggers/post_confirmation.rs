//! Post-confirmation trigger: create the user profile record.

use serde_json::{json, Value};

use crate::error::Result;

use super::records::RecordStore;
use super::{
    default_preferences, parse_preferences, TriggerContext, TriggerEvent, ATTR_CONSENT_VERSION,
    DEFAULT_CONSENT_VERSION,
};

/// Suffix of the profile collection, `{project}-user-profiles`.
pub const PROFILES_COLLECTION: &str = "user-profiles";

pub fn handle<R: RecordStore>(
    records: &R,
    ctx: &TriggerContext,
    event: TriggerEvent,
) -> Result<TriggerEvent> {
    log::info!(
        "Post-confirmation trigger for user: {}, email: {}",
        event.user_name,
        event.email()
    );

    let profile = build_profile(&event);
    records.put(&ctx.collection(PROFILES_COLLECTION), &event.user_name, profile)?;

    log::info!("Created user profile for: {}", event.user_name);
    Ok(event)
}

/// Profile record for a freshly confirmed user.
pub fn build_profile(event: &TriggerEvent) -> Value {
    let attr = |name: &str| event.attribute(name).unwrap_or("").to_string();
    let now = crate::time::now_rfc3339();

    json!({
        "user_id": event.user_name,
        "email": attr("email"),
        "given_name": attr("given_name"),
        "family_name": attr("family_name"),
        "birthdate": attr("birthdate"),
        "preferences": parse_preferences(event).unwrap_or_else(default_preferences),
        "consent_version": event
            .attribute(ATTR_CONSENT_VERSION)
            .unwrap_or(DEFAULT_CONSENT_VERSION),
        "created_at": now,
        "last_updated": now,
        "status": "active",
        "session_count": 0,
        "total_conversation_time": 0,
    })
}
