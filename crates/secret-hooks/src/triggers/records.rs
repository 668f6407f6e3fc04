//! Keyed record store backing the identity triggers.
//!
//! Records are JSON objects addressed by `(collection, key)`. The triggers
//! only need point reads and whole-record writes.
//!
//! [`FileRecordStore`] keeps one JSON file per collection:
//! ```json
//! { "version": 1, "collection": "...", "records": { "key": { ... } } }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HookError, Result};

/// Generic keyed record store.
pub trait RecordStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    fn put(&self, collection: &str, key: &str, record: Value) -> Result<()>;
}

impl<R: RecordStore + ?Sized> RecordStore for &R {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        (**self).get(collection, key)
    }

    fn put(&self, collection: &str, key: &str, record: Value) -> Result<()> {
        (**self).put(collection, key, record)
    }
}

/// In-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.records
            .lock()
            .map(|r| r.keys().filter(|(c, _)| c == collection).count())
            .unwrap_or(0)
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let records = self
            .records
            .lock()
            .map_err(|_| HookError::RecordStore("record store lock poisoned".into()))?;
        Ok(records
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, collection: &str, key: &str, record: Value) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| HookError::RecordStore("record store lock poisoned".into()))?;
        records.insert((collection.to_string(), key.to_string()), record);
        Ok(())
    }
}

// ── FileRecordStore ───────────────────────────────────────────────────────────

const RECORD_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    version: u32,
    collection: String,
    records: BTreeMap<String, Value>,
}

/// Filesystem-backed [`RecordStore`], one file per collection.
#[derive(Debug)]
pub struct FileRecordStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Create the store, creating `base_dir` if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(HookError::RecordStore(format!(
                "invalid collection name: {collection:?}"
            )));
        }
        Ok(self.base_dir.join(format!("{collection}.json")))
    }

    fn read(&self, collection: &str) -> Result<BTreeMap<String, Value>> {
        let path = self.collection_path(collection)?;
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = std::fs::read(&path)?;
        let file: CollectionFile = serde_json::from_slice(&bytes).map_err(|e| {
            HookError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
        })?;
        if file.version != RECORD_FILE_VERSION {
            return Err(HookError::InvalidFileFormat(format!(
                "unsupported record file version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(file.records)
    }

    fn write(&self, collection: &str, records: BTreeMap<String, Value>) -> Result<()> {
        let path = self.collection_path(collection)?;
        let file = CollectionFile {
            version: RECORD_FILE_VERSION,
            collection: collection.to_string(),
            records,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| HookError::SerializationError(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        Ok(self.read(collection)?.remove(key))
    }

    fn put(&self, collection: &str, key: &str, record: Value) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| HookError::RecordStore("record store lock poisoned".into()))?;
        let mut records = self.read(collection)?;
        records.insert(key.to_string(), record);
        self.write(collection, records)
    }
}
