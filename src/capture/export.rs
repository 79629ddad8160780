//! Packaging captured steps for test generation

use crate::capture::step::{CapturedStep, StepKind};
use crate::dom::ElementInfo;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A captured step reduced to its selected command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedStep {
    pub id: Uuid,
    pub command: String,
    pub kind: StepKind,
    pub timestamp_millis: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementInfo>,
}

impl ExportedStep {
    /// Export a step; `None` when it has no command to select
    pub fn from_step(step: &CapturedStep) -> Option<Self> {
        let command = step.selected_command()?.to_string();
        let context = step.context.clone().unwrap_or_default();
        Some(Self {
            id: step.id,
            command,
            kind: step.kind,
            timestamp_millis: step.timestamp_millis,
            dom_context: context.dom_context,
            page_url: context.page_url,
            page_title: context.page_title,
            element: context.element,
        })
    }
}

/// A named test and its steps, handed to a [`TestGenerator`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub name: String,
    pub steps: Vec<ExportedStep>,
}

impl TestRequest {
    pub fn new(name: impl Into<String>, steps: &[CapturedStep]) -> Self {
        Self {
            name: name.into(),
            steps: steps.iter().filter_map(ExportedStep::from_step).collect(),
        }
    }

    /// Selected commands in order
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.command.as_str())
    }
}

/// Turns a test request into a test; returns where the test ended up
pub trait TestGenerator {
    fn generate(&self, request: &TestRequest) -> Result<String>;
}

/// File-system friendly form of a test name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "recorded-test".to_string()
    } else {
        slug.to_string()
    }
}

/// Render a `@playwright/test` file with one selected command per line
pub fn render_playwright_test(request: &TestRequest) -> String {
    let name = serde_json::Value::String(request.name.clone()).to_string();
    let mut out = String::from("import { test, expect } from '@playwright/test';\n\n");
    out.push_str(&format!("test({}, async ({{ page }}) => {{\n", name));
    for command in request.commands() {
        out.push_str("  ");
        out.push_str(command);
        out.push('\n');
    }
    out.push_str("});\n");
    out
}

/// Writes `<dir>/<slug>.spec.ts`
#[derive(Debug, Clone)]
pub struct PlaywrightFileWriter {
    dir: PathBuf,
}

impl PlaywrightFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the test for `name` is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.spec.ts", slugify(name)))
    }
}

impl TestGenerator for PlaywrightFileWriter {
    fn generate(&self, request: &TestRequest) -> Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&request.name);
        std::fs::write(&path, render_playwright_test(request))?;
        log::info!("Wrote {} steps to {}", request.steps.len(), path.display());
        Ok(path.display().to_string())
    }
}

/// Writes the request itself as pretty JSON
#[derive(Debug, Clone)]
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TestGenerator for JsonExporter {
    fn generate(&self, request: &TestRequest) -> Result<String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(request)?)?;
        Ok(self.path.display().to_string())
    }
}
