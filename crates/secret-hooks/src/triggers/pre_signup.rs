//! Pre-signup trigger: age gate, external-provider auto-confirm and
//! default custom attributes.

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::error::{HookError, Result};

use super::{
    default_preferences, TriggerEvent, ATTR_CONSENT_VERSION, ATTR_USER_PREFERENCES,
    DEFAULT_CONSENT_VERSION,
};

/// Youngest age allowed to register.
pub const MIN_SIGNUP_AGE: i32 = 13;
/// Trigger source for federated sign-ups.
pub const EXTERNAL_PROVIDER_SOURCE: &str = "PreSignUp_ExternalProvider";

pub fn handle(event: TriggerEvent) -> Result<TriggerEvent> {
    handle_on(event, Utc::now().date_naive())
}

/// Same as [`handle`] with an explicit "today".
pub fn handle_on(mut event: TriggerEvent, today: NaiveDate) -> Result<TriggerEvent> {
    log::info!("Pre-signup trigger for user: {}", event.user_name);

    if let Some(birthdate) = event.attribute("birthdate") {
        if !meets_minimum_age(birthdate, today) {
            log::warn!("Age validation failed for user: {}", event.user_name);
            return Err(HookError::IdentityTriggerValidationFailed(format!(
                "Users must be {MIN_SIGNUP_AGE} years or older to register"
            )));
        }
    }

    if event.trigger_source == EXTERNAL_PROVIDER_SOURCE {
        event.set_response("autoConfirmUser", true);
        event.set_response("autoVerifyEmail", true);
        log::info!("Auto-confirming external provider user: {}", event.user_name);
    }

    let mut attributes = event.request.user_attributes.clone();
    attributes
        .entry(ATTR_CONSENT_VERSION.to_string())
        .or_insert_with(|| DEFAULT_CONSENT_VERSION.to_string());
    attributes
        .entry(ATTR_USER_PREFERENCES.to_string())
        .or_insert_with(|| default_preferences().to_string());

    let attributes: serde_json::Map<String, Value> = attributes
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    event.set_response("userAttributes", Value::Object(attributes));

    log::info!("Successfully processed pre-signup for: {}", event.user_name);
    Ok(event)
}

/// `birthdate` is `YYYY-MM-DD`; unparseable dates never pass.
fn meets_minimum_age(birthdate: &str, today: NaiveDate) -> bool {
    match NaiveDate::parse_from_str(birthdate.trim(), "%Y-%m-%d") {
        Ok(birth) => crate::time::age_on(birth, today) >= MIN_SIGNUP_AGE,
        Err(_) => false,
    }
}
