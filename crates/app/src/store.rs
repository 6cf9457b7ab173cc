//! Transaction log persisted as one JSON document.
//!
//! Every append rewrites the file through a temporary sibling and a rename,
//! so a crash never leaves a half-written log behind.
//!
//! Several processes may share one ledger file. An append holds an exclusive
//! lock on the `<ledger>.lock` sibling, re-reads the log from disk and only
//! writes when the on-disk version is still the expected one.

use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use engine::{Currency, EngineError, LogRecord, LogStore, StoredLog};

use crate::error::AppError;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: Mutex<StoredLog>,
}

impl JsonFileStore {
    /// Opens the log at `path`, or starts an empty one in `currency` when the
    /// file does not exist yet. Nothing is written until the first append.
    pub fn open(path: impl Into<PathBuf>, currency: Currency) -> Result<Self, AppError> {
        let path = path.into();
        let stored = match read_json_file(&path)? {
            Some(stored) => stored,
            None => {
                tracing::info!("no ledger at {}, starting a new one", path.display());
                StoredLog::new(currency)
            }
        };
        tracing::debug!(
            "loaded {} records from {}",
            stored.version(),
            path.display()
        );
        Ok(Self {
            path,
            inner: Mutex::new(stored),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Blocks until this process holds the ledger's write lock. The lock is
    /// released when the returned file is dropped.
    fn lock(&self) -> Result<File, AppError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock()?;
        Ok(file)
    }
}

impl LogStore for JsonFileStore {
    fn load(&self) -> Result<StoredLog, EngineError> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| EngineError::Store("file store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn append(&self, expected_version: u64, record: &LogRecord) -> Result<u64, EngineError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| EngineError::Store("file store poisoned".to_string()))?;
        let store_error =
            |err: AppError| EngineError::Store(format!("{}: {err}", self.path.display()));

        let _lock = self.lock().map_err(store_error)?;
        let on_disk = read_json_file(&self.path).map_err(store_error)?;
        if let Some(on_disk) = on_disk {
            if on_disk.currency != guard.currency {
                return Err(EngineError::CurrencyMismatch(format!(
                    "{} now holds a {} ledger",
                    self.path.display(),
                    on_disk.currency.code()
                )));
            }
            if on_disk.version() != guard.version() {
                tracing::debug!(
                    "{} moved from version {} to {}",
                    self.path.display(),
                    guard.version(),
                    on_disk.version()
                );
                *guard = on_disk;
            }
        }

        let version = guard.append(expected_version, record)?;
        if let Err(err) = write_json_file(&self.path, &guard) {
            guard.records.pop();
            return Err(store_error(err));
        }
        Ok(version)
    }
}

/// Reads the stored log, or `None` when the file does not exist.
fn read_json_file(path: &Path) -> Result<Option<StoredLog>, AppError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(StoredLog::from_json(&raw)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_json_file(path: &Path, stored: &StoredLog) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = stored.to_json()?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}
