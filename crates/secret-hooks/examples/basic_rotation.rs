//! Basic Rotation — seed a secret, walk it through one rotation cycle,
//! inspect the labels.
//!
//! Run with:
//!   cargo run --example basic_rotation -p secret-hooks

use secret_hooks::{
    MemorySecretStore, RotationEvent, RotationHandler, SecretId, SecretStore, SecretTypePolicy,
    SecretValue, StageLabel, StepKind,
};

fn main() {
    // ── 1. Seed a secret ────────────────────────────────────────────────────
    //
    // The first version of a secret is labeled AWSCURRENT. The `password`
    // field tells the policy this is a password-shaped secret.
    let store = MemorySecretStore::new();
    let id = SecretId::new("arn:aws:secretsmanager:us-east-1:123456789012:secret:db");
    let first = store
        .create_secret(
            &id,
            SecretValue::new()
                .with("username", "app")
                .with("password", "initial-password"),
        )
        .expect("seeding should succeed");
    println!("Seeded {id}");
    println!("  Version:    {first} ({})", StageLabel::Current);
    println!();

    // ── 2. Run the four steps as the orchestrator would ────────────────────
    //
    // Each step is a separate call carrying the secret id and step name.
    let handler = RotationHandler::new(store, SecretTypePolicy::default());
    for step in StepKind::CYCLE {
        let response = handler.handle(&RotationEvent::new(id.as_str(), step));
        println!(
            "{step:<13} -> {} {}",
            response.status_code(),
            response.message.as_deref().unwrap_or("")
        );
    }
    println!();

    // ── 3. Inspect the result ───────────────────────────────────────────────
    //
    // The generated version is now current; the seed value is previous.
    for (label, version) in handler
        .store()
        .describe_labels(&id)
        .expect("labels should be readable")
    {
        println!("  {:<12} {version}", label.as_str());
    }

    let current = handler
        .store()
        .get_version(&id, None)
        .expect("current version should exist");
    println!();
    println!("Current fingerprint: {}", current.value.fingerprint());
    println!(
        "Password length:     {}",
        current.value.get("password").map(str::len).unwrap_or(0)
    );
}
