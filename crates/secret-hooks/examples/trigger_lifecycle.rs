//! Trigger Lifecycle — replay a user's sign-up and first sign-in through the
//! trigger dispatcher.
//!
//! Run with:
//!   cargo run --example trigger_lifecycle -p secret-hooks

use secret_hooks::{
    IdentityTriggers, MemoryRecordStore, RecordStore, TriggerContext, TriggerEvent, TriggerKind,
};

fn main() {
    let triggers = IdentityTriggers::new(MemoryRecordStore::new(), TriggerContext::default());

    let user = |source: &str| {
        TriggerEvent::new("user-7", source)
            .with_attribute("email", "sam@example.com")
            .with_attribute("email_verified", "true")
            .with_attribute("given_name", "Sam")
            .with_attribute("birthdate", "2001-04-02")
    };

    // ── 1. Sign-up ──────────────────────────────────────────────────────────
    //
    // Pre-signup checks the age gate and fills in default attributes; the
    // verification email is worded by the custom-message trigger.
    let signup = triggers
        .dispatch(TriggerKind::PreSignUp, user("PreSignUp_SignUp"))
        .expect("adult sign-up should pass");
    println!(
        "Consent version: {}",
        signup.response["userAttributes"]["custom:consent_version"]
    );

    let message = triggers
        .dispatch_by_source(user("CustomMessage_SignUp").with_code_parameter("{####}"))
        .expect("custom message never blocks");
    println!(
        "Email subject:   {}",
        message.response_str("emailSubject").unwrap_or("(none)")
    );

    // ── 2. Confirmation and first sign-in ──────────────────────────────────
    for source in [
        "PostConfirmation_ConfirmSignUp",
        "PreAuthentication_Authentication",
        "PostAuthentication_Authentication",
    ] {
        triggers
            .dispatch_by_source(user(source))
            .expect("trigger should pass");
    }

    // ── 3. Inspect the records ──────────────────────────────────────────────
    let collection = triggers.context().collection("user-profiles");
    if let Ok(Some(profile)) = triggers.records().get(&collection, "user-7") {
        println!();
        println!("Profile ({collection}):");
        println!("  status:      {}", profile["status"]);
        println!("  login_count: {}", profile["login_count"]);
    }
}
