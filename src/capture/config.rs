use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for a capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Idle time before a text field's value is committed as a fill (ms)
    pub debounce_ms: u64,

    /// Identical steps emitted within this window are dropped (ms)
    pub duplicate_window_ms: u64,

    /// Maximum number of captured steps
    pub max_steps: usize,

    /// Keys recorded on keydown; everything else is ignored
    pub meaningful_keys: Vec<String>,

    /// Ids of the recorder's own UI roots; events inside them are ignored
    pub ui_container_ids: Vec<String>,

    /// Longest page summary attached to a step
    pub max_dom_context_len: usize,

    /// Number of most recent steps that keep their page summary
    pub max_contexts: usize,

    /// Longest page URL attached to a step
    pub max_url_len: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            duplicate_window_ms: 1000,
            max_steps: 100,
            meaningful_keys: vec!["Enter".to_string(), "Tab".to_string(), "Escape".to_string()],
            ui_container_ids: vec!["step-recorder-panel".to_string(), "step-recorder-toggle".to_string()],
            max_dom_context_len: 2000,
            max_contexts: 50,
            max_url_len: 200,
        }
    }
}

impl CaptureConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builder method: set the debounce delay
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Builder method: set the duplicate-step window
    pub fn duplicate_window_ms(mut self, ms: u64) -> Self {
        self.duplicate_window_ms = ms;
        self
    }

    /// Builder method: set the step limit
    pub fn max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    /// Builder method: set the recorded keys
    pub fn meaningful_keys(mut self, keys: Vec<String>) -> Self {
        self.meaningful_keys = keys;
        self
    }

    /// Builder method: add an ignored UI root id
    pub fn ui_container_id(mut self, id: impl Into<String>) -> Self {
        self.ui_container_ids.push(id.into());
        self
    }

    /// Whether a key is recorded
    pub fn is_meaningful_key(&self, key: &str) -> bool {
        self.meaningful_keys.iter().any(|k| k == key)
    }
}
