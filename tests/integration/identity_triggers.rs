//! Identity trigger lifecycle through the dispatcher.

use serde_json::{json, Value};

use secret_hooks::triggers::post_authentication::metrics_key;
use secret_hooks::{
    FileRecordStore, HookError, IdentityTriggers, MemoryRecordStore, RecordStore, Result,
    TriggerContext, TriggerEvent, TriggerKind,
};

fn acme() -> TriggerContext {
    TriggerContext {
        project_name: "acme".into(),
        environment: "test".into(),
        ..TriggerContext::default()
    }
}

fn adult(source: &str) -> TriggerEvent {
    TriggerEvent::new("user-42", source)
        .with_attribute("email", "ada@example.com")
        .with_attribute("email_verified", "true")
        .with_attribute("given_name", "Ada")
        .with_attribute("birthdate", "1990-12-10")
}

#[test]
fn signup_through_login_lifecycle() {
    let triggers = IdentityTriggers::new(MemoryRecordStore::new(), acme());

    // ── Step 1: pre-signup fills defaults ──
    let event = triggers
        .dispatch(TriggerKind::PreSignUp, adult("PreSignUp_SignUp"))
        .unwrap();
    assert_eq!(event.response["userAttributes"]["custom:consent_version"], "1.0");

    // ── Step 2: post-confirmation creates the profile ──
    triggers
        .dispatch_by_source(adult("PostConfirmation_ConfirmSignUp"))
        .unwrap();
    let profile = triggers
        .records()
        .get("acme-user-profiles", "user-42")
        .unwrap()
        .unwrap();
    assert_eq!(profile["status"], "active");

    // ── Step 3: two sign-ins ──
    for _ in 0..2 {
        let event = adult("PreAuthentication_Authentication");
        assert_eq!(
            triggers.dispatch(TriggerKind::PreAuthentication, event.clone()).unwrap(),
            event
        );
        triggers
            .dispatch(TriggerKind::PostAuthentication, adult("PostAuthentication_Authentication"))
            .unwrap();
    }

    let profile = triggers
        .records()
        .get("acme-user-profiles", "user-42")
        .unwrap()
        .unwrap();
    assert_eq!(profile["login_count"], 2);
    assert_eq!(profile["given_name"], "Ada");

    let key = metrics_key("user-42", &secret_hooks::time::today_iso());
    let metrics = triggers
        .records()
        .get("acme-session-metrics", &key)
        .unwrap()
        .unwrap();
    assert_eq!(metrics["login_count"], 2);
    assert_eq!(triggers.records().count("acme-user-cache"), 1);
}

#[test]
fn blocking_triggers_propagate_failures() {
    let triggers = IdentityTriggers::new(MemoryRecordStore::new(), acme());

    let minor = TriggerEvent::new("kid", "PreSignUp_SignUp")
        .with_attribute("email", "kid@example.com")
        .with_attribute("birthdate", "2099-01-01");
    assert!(matches!(
        triggers.dispatch(TriggerKind::PreSignUp, minor),
        Err(HookError::IdentityTriggerValidationFailed(_))
    ));

    let no_email = TriggerEvent::new("ghost", "PreAuthentication_Authentication");
    assert!(triggers
        .dispatch(TriggerKind::PreAuthentication, no_email)
        .is_err());
}

#[test]
fn custom_message_without_code_returns_original() {
    let triggers = IdentityTriggers::new(MemoryRecordStore::new(), acme());
    let event = adult("CustomMessage_SignUp");

    let out = triggers.dispatch(TriggerKind::CustomMessage, event.clone()).unwrap();
    assert_eq!(out, event);
    assert!(out.response.get("emailSubject").is_none());
}

#[test]
fn unknown_trigger_source_rejected() {
    let triggers = IdentityTriggers::new(MemoryRecordStore::new(), acme());
    let err = triggers
        .dispatch_by_source(TriggerEvent::new("u", "DefineAuthChallenge_Authentication"))
        .unwrap_err();
    assert!(matches!(err, HookError::UnknownTrigger(_)));
}

/// Record store whose writes always fail.
struct BrokenRecords;

impl RecordStore for BrokenRecords {
    fn get(&self, _: &str, _: &str) -> Result<Option<Value>> {
        Err(HookError::RecordStore("table unavailable".into()))
    }

    fn put(&self, _: &str, _: &str, _: Value) -> Result<()> {
        Err(HookError::RecordStore("table unavailable".into()))
    }
}

#[test]
fn bookkeeping_failures_never_block() {
    let triggers = IdentityTriggers::new(BrokenRecords, acme());

    for (kind, source) in [
        (TriggerKind::PostConfirmation, "PostConfirmation_ConfirmSignUp"),
        (TriggerKind::PostAuthentication, "PostAuthentication_Authentication"),
    ] {
        let event = adult(source);
        let out = triggers.dispatch(kind, event.clone()).unwrap();
        assert_eq!(out, event, "{kind} must return the original event");
    }
}

#[test]
fn file_records_accumulate_across_dispatchers() {
    let tmp = tempfile::tempdir().unwrap();

    for _ in 0..3 {
        let triggers = IdentityTriggers::new(FileRecordStore::new(tmp.path()).unwrap(), acme());
        triggers
            .dispatch(TriggerKind::PostAuthentication, adult("PostAuthentication_Authentication"))
            .unwrap();
    }

    let records = FileRecordStore::new(tmp.path()).unwrap();
    let profile = records.get("acme-user-profiles", "user-42").unwrap().unwrap();
    assert_eq!(profile["login_count"], json!(3));
    assert_eq!(profile["last_login_source"], "PostAuthentication_Authentication");
}
