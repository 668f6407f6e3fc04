//! Integration tests for the CLI binary.
//!
//! Runs the `shk` binary against a temporary store directory.
//!
//! This test is registered as a [[test]] in the secret-hooks-cli crate
//! so that CARGO_BIN_EXE_shk is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `shk` binary.
fn shk_binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_shk"));
    cmd.env_remove("SECRET_HOOKS_DIR")
        .env_remove("PROJECT_NAME")
        .env_remove("ENVIRONMENT");
    cmd
}

fn shk(store: &Path, args: &[&str]) -> Output {
    shk_binary()
        .arg("--store")
        .arg(store)
        .args(args)
        .output()
        .expect("failed to execute shk")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_responds_to_help() {
    let output = shk_binary()
        .arg("--help")
        .output()
        .expect("failed to execute shk --help");

    assert_success(&output, "shk --help");
    let out = stdout(&output);
    assert!(
        out.contains("shk") || out.contains("Usage"),
        "shk --help output should contain usage information, got: {out}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = shk_binary()
        .arg("--version")
        .output()
        .expect("failed to execute shk --version");

    assert_success(&output, "shk --version");
    assert!(stdout(&output).contains("0.1"));
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = shk_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute shk");

    assert!(
        !output.status.success(),
        "shk with unknown flag should exit with error"
    );
}

#[test]
fn cli_create_rotate_and_show() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path();

    let output = shk(
        store,
        &["secret", "create", "--id", "db/main", "--value", r#"{"username":"app","password":"initial-pass"}"#],
    );
    assert_success(&output, "secret create");

    let output = shk(store, &["rotate-all", "--id", "db/main"]);
    assert_success(&output, "rotate-all");
    let out = stdout(&output);
    assert!(out.contains("createSecret:"), "got: {out}");
    assert!(out.contains("finishSecret:"), "got: {out}");

    let output = shk(store, &["secret", "labels", "--id", "db/main"]);
    assert_success(&output, "secret labels");
    let out = stdout(&output);
    assert!(out.contains("AWSCURRENT"));
    assert!(out.contains("AWSPREVIOUS  sv_"), "got: {out}");

    // Old value is masked by default, shown with --reveal.
    let output = shk(store, &["secret", "show", "--id", "db/main", "--stage", "previous"]);
    assert_success(&output, "secret show");
    let out = stdout(&output);
    assert!(!out.contains("initial-pass"));
    let created = out
        .lines()
        .find(|l| l.starts_with("Created:"))
        .expect("show prints a creation time");
    assert!(created.trim_end().ends_with('Z'), "got: {created}");

    let output = shk(
        store,
        &["secret", "show", "--id", "db/main", "--stage", "AWSPREVIOUS", "--reveal"],
    );
    assert_success(&output, "secret show --reveal");
    assert!(stdout(&output).contains("initial-pass"));
}

#[test]
fn cli_rotate_prints_json_response() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path();

    shk(store, &["secret", "create", "--id", "svc", "--value", r#"{"key":"aaaaaaaaaaaaaaaaaaaa"}"#]);

    let output = shk(store, &["rotate", "--id", "svc", "--step", "createSecret"]);
    assert_success(&output, "rotate createSecret");
    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["secretId"], "svc");

    let output = shk(store, &["rotate", "--id", "svc", "--step", "rollback"]);
    assert!(!output.status.success());
    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["kind"], "unknown_step");
}

#[test]
fn cli_rotate_missing_secret_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let output = shk(tmp.path(), &["rotate", "--id", "nope", "--step", "createSecret"]);

    assert!(!output.status.success());
    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["error"]["kind"], "secret_not_found");
}

#[test]
fn cli_trigger_custom_message() {
    let tmp = tempfile::tempdir().unwrap();
    let event_path = tmp.path().join("event.json");
    std::fs::write(
        &event_path,
        r#"{
            "userName": "user-1",
            "triggerSource": "CustomMessage_ForgotPassword",
            "request": {"userAttributes": {"given_name": "Ada"}, "codeParameter": "{####}"},
            "response": {}
        }"#,
    )
    .unwrap();

    let output = shk(tmp.path(), &["trigger", "--event", event_path.to_str().unwrap()]);
    assert_success(&output, "trigger");

    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["response"]["emailSubject"], "InnerWorld - Reset Your Password");
    assert!(event["response"]["emailMessage"]
        .as_str()
        .unwrap()
        .contains("Hi Ada"));
}

#[test]
fn cli_trigger_pre_signup_rejects_minor() {
    let tmp = tempfile::tempdir().unwrap();
    let event_path = tmp.path().join("event.json");
    std::fs::write(
        &event_path,
        r#"{
            "userName": "kid",
            "triggerSource": "PreSignUp_SignUp",
            "request": {"userAttributes": {"email": "kid@example.com", "birthdate": "2099-01-01"}}
        }"#,
    )
    .unwrap();

    let output = shk(
        tmp.path(),
        &["trigger", "--kind", "pre-signup", "--event", event_path.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("13 years"));
}
