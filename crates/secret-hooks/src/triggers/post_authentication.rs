//! Post-authentication trigger: login bookkeeping.
//!
//! Three independent updates run on every successful sign-in:
//!
//! 1. the profile record gets `last_login`, `login_count` and
//!    `last_login_source`;
//! 2. a `user-cache` record with a one-hour `ttl` is written;
//! 3. the per-user, per-day `session-metrics` record is incremented.
//!
//! A failing update does not stop the others. The first error is returned.

use serde_json::{json, Map, Value};

use crate::error::Result;

use super::post_confirmation::PROFILES_COLLECTION;
use super::records::RecordStore;
use super::{parse_preferences, TriggerContext, TriggerEvent};

pub const CACHE_COLLECTION: &str = "user-cache";
pub const METRICS_COLLECTION: &str = "session-metrics";
/// Lifetime of a cache record, in seconds.
pub const CACHE_TTL_SECS: i64 = 3600;

pub fn handle<R: RecordStore>(
    records: &R,
    ctx: &TriggerContext,
    event: TriggerEvent,
) -> Result<TriggerEvent> {
    log::info!(
        "Post-authentication trigger for user: {}, email: {}, source: {}",
        event.user_name,
        event.email(),
        event.trigger_source
    );

    let results = [
        ("update login info", update_login_info(records, ctx, &event)),
        ("cache user context", cache_user_context(records, ctx, &event)),
        ("update session metrics", update_session_metrics(records, ctx, &event)),
    ];

    let mut first_error = None;
    for (what, result) in results {
        if let Err(e) = result {
            log::error!("Failed to {what}: {e}");
            first_error.get_or_insert(e);
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    log::info!(
        "Post-authentication processing completed for user: {}",
        event.user_name
    );
    Ok(event)
}

fn update_login_info<R: RecordStore>(
    records: &R,
    ctx: &TriggerContext,
    event: &TriggerEvent,
) -> Result<()> {
    let collection = ctx.collection(PROFILES_COLLECTION);
    let mut profile = load_object(records, &collection, &event.user_name)?;

    profile.insert("user_id".into(), json!(event.user_name));
    profile.insert("last_login".into(), json!(crate::time::now_rfc3339()));
    profile.insert("last_login_source".into(), json!(event.trigger_source));
    increment(&mut profile, "login_count");

    records.put(&collection, &event.user_name, Value::Object(profile))?;
    log::info!("Updated login info for user: {}", event.user_name);
    Ok(())
}

fn cache_user_context<R: RecordStore>(
    records: &R,
    ctx: &TriggerContext,
    event: &TriggerEvent,
) -> Result<()> {
    let record = json!({
        "user_id": event.user_name,
        "email": event.email(),
        "preferences": parse_preferences(event).unwrap_or_else(|| json!({})),
        "cached_at": crate::time::now_rfc3339(),
        "ttl": crate::time::now_unix_secs() + CACHE_TTL_SECS,
    });

    records.put(&ctx.collection(CACHE_COLLECTION), &event.user_name, record)?;
    log::info!("Cached user context for: {}", event.user_name);
    Ok(())
}

fn update_session_metrics<R: RecordStore>(
    records: &R,
    ctx: &TriggerContext,
    event: &TriggerEvent,
) -> Result<()> {
    let collection = ctx.collection(METRICS_COLLECTION);
    let date = crate::time::today_iso();
    let key = metrics_key(&event.user_name, &date);

    let mut metrics = load_object(records, &collection, &key)?;
    metrics.insert("user_id".into(), json!(event.user_name));
    metrics.insert("date".into(), json!(date));
    metrics.insert("last_login".into(), json!(crate::time::now_rfc3339()));
    increment(&mut metrics, "login_count");

    records.put(&collection, &key, Value::Object(metrics))?;
    log::info!("Updated session metrics for user: {}", event.user_name);
    Ok(())
}

/// Key of the per-day metrics record.
pub fn metrics_key(user_id: &str, date: &str) -> String {
    format!("{user_id}#{date}")
}

fn load_object<R: RecordStore>(records: &R, collection: &str, key: &str) -> Result<Map<String, Value>> {
    Ok(match records.get(collection, key)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

fn increment(record: &mut Map<String, Value>, field: &str) {
    let count = record.get(field).and_then(Value::as_u64).unwrap_or(0);
    record.insert(field.into(), json!(count + 1));
}
