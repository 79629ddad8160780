//! Durable key/value storage for capture state
//!
//! The store is the single source of truth for the step sequence: review
//! surfaces may edit it while capture is running, so every write is preceded
//! by a fresh read. Plain reads are best-effort: failures are logged and
//! resolve to defaults. A read-modify-write of the steps is the exception:
//! when the read fails nothing is written, so a transient error can never
//! replace the persisted sequence.

use crate::capture::step::CapturedStep;
use crate::error::{RecorderError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Key of the capture-active flag
pub const KEY_ACTIVE: &str = "stepCaptureActive";

/// Key of the step sequence
pub const KEY_STEPS: &str = "capturedSteps";

/// Key of the URL capture started on
pub const KEY_URL: &str = "currentCaptureUrl";

/// Key of the clock time capture started at; step timestamps are relative to it
pub const KEY_START: &str = "captureStartTime";

/// A key/value store shared with other surfaces
pub trait CaptureStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RecorderError {
    RecorderError::Storage("store lock poisoned".to_string())
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().map_err(poisoned)?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every operation re-reads the file, so edits made by another process are
/// picked up on the next access. Writes go to a temporary file in the same
/// directory which then replaces the original, so readers never see a
/// partially written file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(RecorderError::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write(&self, map: Map<String, Value>) -> Result<()> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let content = serde_json::to_string_pretty(&Value::Object(map))?;

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl CaptureStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut map = self.read()?;
        map.insert(key.to_string(), value);
        self.write(map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut map = self.read()?;
        if map.remove(key).is_some() {
            self.write(map)?;
        }
        Ok(())
    }
}

/// Typed, best-effort view of the capture keys
#[derive(Clone)]
pub struct CaptureState {
    store: Arc<dyn CaptureStore>,
}

impl CaptureState {
    pub fn new(store: Arc<dyn CaptureStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<Value> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read '{}' from capture store: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: Value) {
        if let Err(e) = self.store.set(key, value) {
            log::warn!("Failed to write '{}' to capture store: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::warn!("Failed to remove '{}' from capture store: {}", key, e);
        }
    }

    /// Persisted capture-active flag; `false` when unreadable
    pub fn is_active(&self) -> bool {
        self.read(KEY_ACTIVE).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn set_active(&self, active: bool) {
        self.write(KEY_ACTIVE, Value::Bool(active));
    }

    /// Persisted steps; empty when missing.
    ///
    /// Unlike [`CaptureState::steps`] this tells a missing sequence apart
    /// from one that could not be read or parsed.
    pub fn load_steps(&self) -> Result<Vec<CapturedStep>> {
        match self.store.get(KEY_STEPS)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persisted steps; empty when missing or unreadable
    pub fn steps(&self) -> Vec<CapturedStep> {
        self.load_steps().unwrap_or_else(|e| {
            log::warn!("Failed to read captured steps: {}", e);
            Vec::new()
        })
    }

    fn store_steps(&self, steps: &[CapturedStep]) -> Result<()> {
        self.store.set(KEY_STEPS, serde_json::to_value(steps)?)
    }

    pub fn set_steps(&self, steps: &[CapturedStep]) {
        if let Err(e) = self.store_steps(steps) {
            log::warn!("Failed to write captured steps: {}", e);
        }
    }

    /// Read, modify and write back the step sequence.
    ///
    /// If the read fails, `f` is not called and nothing is written. If `f`
    /// leaves the sequence unchanged, nothing is written either.
    pub fn update_steps<R>(&self, f: impl FnOnce(&mut Vec<CapturedStep>) -> R) -> Result<R> {
        let before = self.load_steps()?;
        let mut steps = before.clone();
        let result = f(&mut steps);
        if steps != before {
            self.store_steps(&steps)?;
        }
        Ok(result)
    }

    pub fn origin_url(&self) -> Option<String> {
        self.read(KEY_URL).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn set_origin_url(&self, url: &str) {
        self.write(KEY_URL, Value::String(url.to_string()));
    }

    pub fn start_time(&self) -> Option<u64> {
        self.read(KEY_START).and_then(|v| v.as_u64())
    }

    pub fn set_start_time(&self, millis: u64) {
        self.write(KEY_START, Value::from(millis));
    }

    /// Remove every capture key
    pub fn clear(&self) {
        for key in [KEY_ACTIVE, KEY_STEPS, KEY_URL, KEY_START] {
            self.remove(key);
        }
    }
}
