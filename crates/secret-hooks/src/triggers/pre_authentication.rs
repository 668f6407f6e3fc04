//! Pre-authentication trigger: account-standing check plus an audit line
//! for every attempt.

use serde_json::json;

use crate::error::{HookError, Result};

use super::{TriggerContext, TriggerEvent};

const RESTRICTED_MESSAGE: &str = "Account access has been restricted. Please contact support.";

pub fn handle(ctx: &TriggerContext, event: TriggerEvent) -> Result<TriggerEvent> {
    log::info!(
        "Pre-authentication trigger for user: {}, source: {}",
        event.user_name,
        event.trigger_source
    );

    if let Err(e) = check_standing(&event) {
        log_attempt(ctx, &event, Some(&e.to_string()));
        return Err(e);
    }

    log_attempt(ctx, &event, None);
    Ok(event)
}

fn check_standing(event: &TriggerEvent) -> Result<()> {
    if event.email().is_empty() {
        log::warn!("User {} missing email attribute", event.user_name);
        return Err(HookError::IdentityTriggerValidationFailed(
            RESTRICTED_MESSAGE.into(),
        ));
    }

    // Federated sign-ins may arrive unverified; only note it.
    let verified = event
        .attribute("email_verified")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !verified {
        log::warn!("User {} email not verified", event.user_name);
    }

    Ok(())
}

fn log_attempt(ctx: &TriggerContext, event: &TriggerEvent, error: Option<&str>) {
    let mut entry = json!({
        "timestamp": crate::time::now_rfc3339(),
        "user_id": event.user_name,
        "trigger_source": event.trigger_source,
        "success": error.is_none(),
        "project": ctx.project_name,
        "environment": ctx.environment,
    });
    if let Some(error) = error {
        entry["error"] = json!(error);
    }
    log::info!(target: "audit", "Authentication attempt logged: {entry}");
}
