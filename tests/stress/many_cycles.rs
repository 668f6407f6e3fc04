//! Stress test: long runs of rotation cycles on a single secret.

use std::collections::HashSet;

use secret_hooks::{
    FileSecretStore, HookError, MemorySecretStore, RotationHandler, SecretId, SecretStore,
    SecretTypePolicy, SecretValue, StageLabel, StepKind, UNLABELED_VERSION_RETENTION,
};

#[test]
fn stress_500_password_cycles_keep_label_invariants() {
    let handler = RotationHandler::new(MemorySecretStore::new(), SecretTypePolicy::default());
    let id = SecretId::new("db/high-churn");
    handler
        .store()
        .create_secret(&id, SecretValue::new().with("password", "seed-password"))
        .unwrap();

    let mut seen = HashSet::new();
    for i in 0..500 {
        let before = handler.store().get_version(&id, None).unwrap().version_id;

        for step in StepKind::CYCLE {
            handler
                .execute_step(&id, step)
                .unwrap_or_else(|e| panic!("cycle {i} {step} failed: {e}"));
        }

        let labels = handler.store().describe_labels(&id).unwrap();
        assert_eq!(labels.get(&StageLabel::Previous), Some(&before), "cycle {i}");
        assert!(!labels.contains_key(&StageLabel::Pending), "cycle {i}");

        let current = handler.store().get_version(&id, None).unwrap();
        let password = current.value.get("password").unwrap().to_string();
        assert_eq!(password.chars().count(), 32);
        assert!(seen.insert(password), "password repeated at cycle {i}");
    }

    // CURRENT, PREVIOUS and the retained unlabeled history.
    let versions = handler.store().list_versions(&id).unwrap();
    assert_eq!(versions.len(), UNLABELED_VERSION_RETENTION + 2);
    let labelled = versions.iter().filter(|v| !v.labels.is_empty()).count();
    assert_eq!(labelled, 2);
}

#[test]
fn stress_100_key_cycles_on_file_store() {
    let tmp = tempfile::tempdir().unwrap();
    let id = SecretId::new("svc/file-key");
    let store = FileSecretStore::new(tmp.path()).unwrap();
    store
        .create_secret(&id, SecretValue::new().with("key", "initial-key-material-0000"))
        .unwrap();
    let handler = RotationHandler::new(store, SecretTypePolicy::default());

    for i in 0..100 {
        for step in StepKind::CYCLE {
            handler
                .execute_step(&id, step)
                .unwrap_or_else(|e| panic!("cycle {i} {step} failed: {e}"));
        }
    }

    // Reopen from disk and check the final state.
    let reopened = FileSecretStore::new(tmp.path()).unwrap();
    let labels = reopened.describe_labels(&id).unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(
        reopened.list_versions(&id).unwrap().len(),
        UNLABELED_VERSION_RETENTION + 2
    );
    assert_eq!(reopened.list_secrets().unwrap(), vec![id]);
}

#[test]
fn stress_retried_steps_are_idempotent() {
    let handler = RotationHandler::new(MemorySecretStore::new(), SecretTypePolicy::default());
    let id = SecretId::new("db/retried");
    handler
        .store()
        .create_secret(&id, SecretValue::new().with("password", "seed-password"))
        .unwrap();

    for _ in 0..50 {
        // Steps before finish delivered three times, as an at-least-once
        // orchestrator may.
        for step in [StepKind::CreateSecret, StepKind::SetSecret, StepKind::TestSecret] {
            for _ in 0..3 {
                handler.execute_step(&id, step).unwrap();
            }
        }
        handler.execute_step(&id, StepKind::FinishSecret).unwrap();
        // A late duplicate finish finds nothing staged and changes nothing.
        assert!(matches!(
            handler.execute_step(&id, StepKind::FinishSecret),
            Err(HookError::NoPendingVersion(_))
        ));

        let labels = handler.store().describe_labels(&id).unwrap();
        assert!(labels.contains_key(&StageLabel::Current));
        assert!(!labels.contains_key(&StageLabel::Pending));
    }

    // One generated version per cycle despite the retries, then pruned.
    assert_eq!(
        handler.store().list_versions(&id).unwrap().len(),
        UNLABELED_VERSION_RETENTION + 2
    );
}
