//! Persistence port.
//!
//! The engine does not own storage. A [`LogStore`] hands out the recorded log
//! on load and accepts appended records with "append if version unchanged"
//! semantics, which is what keeps a single writer per log.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, LogRecord, ResultEngine};

/// Serialized form of a whole log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLog {
    pub currency: Currency,
    pub records: Vec<LogRecord>,
}

impl StoredLog {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            records: Vec::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.records.len() as u64
    }

    /// Appends `record` if the log is still at `expected_version`.
    pub fn append(&mut self, expected_version: u64, record: &LogRecord) -> ResultEngine<u64> {
        let actual = self.version();
        if actual != expected_version {
            return Err(EngineError::ConcurrentModification {
                expected: expected_version,
                actual,
            });
        }
        self.records.push(record.clone());
        Ok(self.version())
    }

    pub fn to_json(&self) -> ResultEngine<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| EngineError::Store(format!("serialize failed: {err}")))
    }

    pub fn from_json(raw: &str) -> ResultEngine<Self> {
        serde_json::from_str(raw)
            .map_err(|err| EngineError::Store(format!("deserialize failed: {err}")))
    }
}

pub trait LogStore: Send + Sync + std::fmt::Debug {
    /// Returns every record persisted so far.
    fn load(&self) -> ResultEngine<StoredLog>;

    /// Persists `record` only if the stored log is at `expected_version`.
    /// Returns the new version.
    fn append(&self, expected_version: u64, record: &LogRecord) -> ResultEngine<u64>;
}

/// In-memory store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoredLog>,
}

impl MemoryStore {
    pub fn new(currency: Currency) -> Self {
        Self {
            inner: Mutex::new(StoredLog::new(currency)),
        }
    }
}

impl LogStore for MemoryStore {
    fn load(&self) -> ResultEngine<StoredLog> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| EngineError::Store("memory store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn append(&self, expected_version: u64, record: &LogRecord) -> ResultEngine<u64> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| EngineError::Store("memory store poisoned".to_string()))?;
        guard.append(expected_version, record)
    }
}
