//! End-to-end rotation cycles through the public API.

use std::cell::Cell;
use std::collections::BTreeMap;

use secret_hooks::{
    FileSecretStore, HookError, LabelTransition, MemorySecretStore, Result, RotationEvent,
    RotationHandler, SecretId, SecretStore, SecretTypePolicy, SecretValue, StageLabel, StepKind,
    StepOutcome, StoredVersion, VersionId,
};

fn run_cycle<S: SecretStore>(handler: &RotationHandler<S>, id: &SecretId) -> Vec<StepOutcome> {
    StepKind::CYCLE
        .into_iter()
        .map(|step| handler.execute_step(id, step).unwrap())
        .collect()
}

#[test]
fn password_cycle_end_to_end() {
    let handler = RotationHandler::new(MemorySecretStore::new(), SecretTypePolicy::default());
    let id = SecretId::new("arn:aws:secretsmanager:us-east-1:123:secret:db-password");
    let original = handler
        .store()
        .create_secret(&id, SecretValue::new().with("password", "old"))
        .unwrap();

    // ── Step 1: createSecret stages a generated password ──
    let outcome = handler.execute_step(&id, StepKind::CreateSecret).unwrap();
    let StepOutcome::Created { version_id: pending_id, .. } = outcome else {
        panic!("expected a created pending version");
    };
    let pending = handler
        .store()
        .get_version(&id, Some(StageLabel::Pending))
        .unwrap();
    let new_password = pending.value.get("password").unwrap().to_string();
    assert_eq!(new_password.chars().count(), 32);
    assert!(pending.value.contains("created_at"));

    // ── Step 2: setSecret and testSecret ──
    assert_eq!(
        handler.execute_step(&id, StepKind::SetSecret).unwrap(),
        StepOutcome::NoOp
    );
    assert!(matches!(
        handler.execute_step(&id, StepKind::TestSecret).unwrap(),
        StepOutcome::Validated { .. }
    ));

    // ── Step 3: finishSecret promotes ──
    handler.execute_step(&id, StepKind::FinishSecret).unwrap();

    let labels = handler.store().describe_labels(&id).unwrap();
    assert_eq!(labels.get(&StageLabel::Current), Some(&pending_id));
    assert_eq!(labels.get(&StageLabel::Previous), Some(&original));
    assert!(!labels.contains_key(&StageLabel::Pending));

    let current = handler.store().get_version(&id, None).unwrap();
    assert_eq!(current.value.get("password"), Some(new_password.as_str()));

    let previous = handler
        .store()
        .get_version(&id, Some(StageLabel::Previous))
        .unwrap();
    assert_eq!(previous.value, SecretValue::new().with("password", "old"));
}

#[test]
fn short_seeded_key_fails_test_and_keeps_current() {
    let store = MemorySecretStore::new();
    let id = SecretId::new("svc/signing-key");
    let current_id = store
        .create_secret(&id, SecretValue::new().with("key", "a-perfectly-long-key-value"))
        .unwrap();
    store
        .put_version(&id, SecretValue::new().with("key", "tiny!"), StageLabel::Pending)
        .unwrap();

    let handler = RotationHandler::new(&store, SecretTypePolicy::default());
    let err = handler.execute_step(&id, StepKind::TestSecret).unwrap_err();
    match err {
        HookError::SecretValidationFailed { reason, .. } => {
            assert!(reason.contains("key"), "reason: {reason}");
            assert!(!reason.contains("tiny!"), "value leaked into reason: {reason}");
        }
        other => panic!("expected SecretValidationFailed, got {other:?}"),
    }

    assert_eq!(
        store.describe_labels(&id).unwrap().get(&StageLabel::Current),
        Some(&current_id)
    );
}

#[test]
fn abandoned_pending_is_replaced_by_next_cycle() {
    let store = MemorySecretStore::new();
    let id = SecretId::new("svc/signing-key");
    let seeded = store
        .create_secret(&id, SecretValue::new().with("key", "a-perfectly-long-key-value"))
        .unwrap();
    let stale = store
        .put_version(&id, SecretValue::new().with("key", "tiny!"), StageLabel::Pending)
        .unwrap();

    let handler = RotationHandler::new(&store, SecretTypePolicy::default());
    assert!(handler.execute_step(&id, StepKind::TestSecret).is_err());

    // The next cycle stages a fresh key instead of reusing the stale one.
    let outcomes = run_cycle(&handler, &id);
    assert!(matches!(outcomes[0], StepOutcome::Created { .. }));

    let labels = store.describe_labels(&id).unwrap();
    assert_eq!(labels.get(&StageLabel::Previous), Some(&seeded));
    assert_ne!(labels.get(&StageLabel::Current), Some(&stale));

    let current = store.get_version(&id, None).unwrap();
    let key = current.value.get("key").unwrap();
    assert_eq!(key.len(), 43);
    assert_ne!(key, "tiny!");
}

#[test]
fn file_store_cycle_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let id = SecretId::new("db/main");

    {
        let store = FileSecretStore::new(tmp.path()).unwrap();
        store
            .create_secret(&id, SecretValue::new().with("username", "app").with("password", "old"))
            .unwrap();
        let handler = RotationHandler::new(store, SecretTypePolicy::default());
        handler.execute_step(&id, StepKind::CreateSecret).unwrap();
    }

    // A fresh process picks up the staged version and finishes the cycle.
    let store = FileSecretStore::new(tmp.path()).unwrap();
    let handler = RotationHandler::new(store, SecretTypePolicy::default());
    assert!(matches!(
        handler.execute_step(&id, StepKind::CreateSecret).unwrap(),
        StepOutcome::AlreadyPending { .. }
    ));
    handler.execute_step(&id, StepKind::TestSecret).unwrap();
    handler.execute_step(&id, StepKind::FinishSecret).unwrap();

    let current = handler.store().get_version(&id, None).unwrap();
    assert_eq!(current.value.get("username"), Some("app"));
    assert_ne!(current.value.get("password"), Some("old"));
    assert_eq!(handler.store().list_versions(&id).unwrap().len(), 2);
}

#[test]
fn second_cycle_moves_previous_forward() {
    let handler = RotationHandler::new(MemorySecretStore::new(), SecretTypePolicy::default());
    let id = SecretId::new("svc/key");
    let first = handler
        .store()
        .create_secret(&id, SecretValue::new().with("key", "k".repeat(40)))
        .unwrap();

    run_cycle(&handler, &id);
    let second = handler.store().get_version(&id, None).unwrap().version_id;
    run_cycle(&handler, &id);
    let third = handler.store().get_version(&id, None).unwrap().version_id;

    let labels = handler.store().describe_labels(&id).unwrap();
    assert_eq!(labels.get(&StageLabel::Current), Some(&third));
    assert_eq!(labels.get(&StageLabel::Previous), Some(&second));

    let versions = handler.store().list_versions(&id).unwrap();
    assert_eq!(versions.len(), 3);
    let oldest = versions.iter().find(|v| v.version_id == first).unwrap();
    assert!(oldest.labels.is_empty());
}

#[test]
fn api_key_cycle_stops_at_test() {
    let handler = RotationHandler::new(MemorySecretStore::new(), SecretTypePolicy::default());
    let id = SecretId::new("vendor/api");
    handler
        .store()
        .create_secret(&id, SecretValue::new().with("api_key", "vendor-issued-key"))
        .unwrap();

    assert_eq!(
        handler.execute_step(&id, StepKind::CreateSecret).unwrap(),
        StepOutcome::ManualRotation
    );
    assert!(!handler
        .store()
        .describe_labels(&id)
        .unwrap()
        .contains_key(&StageLabel::Pending));
    assert!(matches!(
        handler.execute_step(&id, StepKind::TestSecret),
        Err(HookError::NoPendingVersion(_))
    ));
}

// ── Store wrappers ────────────────────────────────────────────────────────────

/// Counts calls and can fail every call with `StoreUnavailable`.
struct CountingStore {
    inner: MemorySecretStore,
    calls: Cell<usize>,
    down: Cell<bool>,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemorySecretStore::new(),
            calls: Cell::new(0),
            down: Cell::new(false),
        }
    }

    fn enter(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.down.get() {
            return Err(HookError::StoreUnavailable("connection reset".into()));
        }
        Ok(())
    }
}

impl SecretStore for CountingStore {
    fn create_secret(&self, id: &SecretId, value: SecretValue) -> Result<VersionId> {
        self.enter()?;
        self.inner.create_secret(id, value)
    }

    fn get_version(&self, id: &SecretId, label: Option<StageLabel>) -> Result<StoredVersion> {
        self.enter()?;
        self.inner.get_version(id, label)
    }

    fn put_version(&self, id: &SecretId, value: SecretValue, label: StageLabel) -> Result<VersionId> {
        self.enter()?;
        self.inner.put_version(id, value, label)
    }

    fn apply_transition(&self, id: &SecretId, transition: &LabelTransition) -> Result<()> {
        self.enter()?;
        self.inner.apply_transition(id, transition)
    }

    fn describe_labels(&self, id: &SecretId) -> Result<BTreeMap<StageLabel, VersionId>> {
        self.enter()?;
        self.inner.describe_labels(id)
    }

    fn list_versions(&self, id: &SecretId) -> Result<Vec<StoredVersion>> {
        self.enter()?;
        self.inner.list_versions(id)
    }
}

#[test]
fn invalid_events_never_reach_store() {
    let handler = RotationHandler::new(CountingStore::new(), SecretTypePolicy::default());

    let response = handler.handle(&RotationEvent {
        secret_id: "db/main".into(),
        step: "rollbackSecret".into(),
    });
    assert!(!response.success);
    assert_eq!(response.status_code(), 400);

    let response = handler.handle_json(r#"{"Step": "createSecret"}"#);
    assert_eq!(response.secret_id, "unknown");
    assert_eq!(response.error.unwrap().kind, "missing_secret_id");

    assert_eq!(handler.store().calls.get(), 0);
}

#[test]
fn unavailable_store_is_retryable() {
    let store = CountingStore::new();
    let id = SecretId::new("db/main");
    store
        .create_secret(&id, SecretValue::new().with("password", "old"))
        .unwrap();
    let handler = RotationHandler::new(store, SecretTypePolicy::default());

    handler.store().down.set(true);
    let response = handler.handle(&RotationEvent::new("db/main", StepKind::CreateSecret));
    assert_eq!(response.status_code(), 503);
    assert!(response.error.as_ref().unwrap().retryable);

    // Orchestrator retries once the store is back.
    handler.store().down.set(false);
    let response = handler.handle(&RotationEvent::new("db/main", StepKind::CreateSecret));
    assert!(response.success, "{response:?}");
    assert!(handler
        .store()
        .describe_labels(&id)
        .unwrap()
        .contains_key(&StageLabel::Pending));
}
