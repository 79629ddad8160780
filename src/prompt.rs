//! Plain-text task prompts for coding assistants
//!
//! Each formatter is pure: data in, prompt text out.

use crate::capture::{CapturedStep, ExportedStep};
use crate::dom::ElementInfo;
use serde::{Deserialize, Serialize};

const SCENARIO_GUIDANCE: &str = "\
Below is a recorded test scenario for which you are expected to write a test script.

Follow the structure of the workspace's existing end-to-end tests. If they use page objects, reuse the \
existing abstractions and add new ones where needed.

Add assertions that verify the expected behaviour.

Write the test with Playwright in JavaScript unless the workspace already uses another language.

Once written, run the test to verify it works and show the result.";

/// Where on the application a task applies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_url: Option<String>,

    /// Source files likely to implement the screen
    #[serde(default)]
    pub file_paths: Vec<String>,
}

impl ScreenInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the screen name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method: set the relative URL
    pub fn with_relative_url(mut self, url: impl Into<String>) -> Self {
        self.relative_url = Some(url.into());
        self
    }

    /// Builder method: add a candidate source file
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    fn push_file_paths(&self, out: &mut String) {
        if self.file_paths.is_empty() {
            return;
        }
        out.push_str("\nHere are some potential file paths related to the screen:");
        for path in &self.file_paths {
            out.push_str("\n- ");
            out.push_str(path);
        }
    }
}

/// A bug to hand to an assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BugReport {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub screen: ScreenInfo,
}

/// A UI element the user pointed at while describing a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextElement {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Prompt asking for a test script that reproduces recorded steps
pub fn format_scenario_prompt(name: &str, steps: &[CapturedStep]) -> String {
    let mut out = String::from(SCENARIO_GUIDANCE);
    out.push_str("\n\n====\n\n");
    out.push_str(&format!("Test scenario: {}\n\nRecorded steps:", name));

    let exported = steps.iter().filter_map(ExportedStep::from_step);
    for (i, step) in exported.enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, step.command));
    }
    out.push('\n');
    out
}

/// Prompt asking for a bug fix
pub fn format_bug_prompt(bug: &BugReport) -> String {
    let mut out = String::from("Fix the following bug in the codebase:");
    if !bug.title.is_empty() {
        out.push_str(&format!("\nTitle: {}", bug.title));
    }
    if !bug.description.is_empty() {
        out.push_str(&format!("\nDescription: {}", bug.description));
    }
    if let Some(name) = &bug.screen.name {
        out.push_str(&format!("\nScreen: {}", name));
    }
    if let Some(url) = &bug.screen.relative_url {
        out.push_str(&format!("\nScreen relative URL: {}", url));
    }
    bug.screen.push_file_paths(&mut out);
    out.push('\n');
    out
}

/// Prompt describing a development task and the elements it refers to
pub fn format_dev_task_prompt(instruction: &str, elements: &[ContextElement], screen: Option<&ScreenInfo>) -> String {
    let mut out = format!("# requirement:\n{}\n", instruction);

    if !elements.is_empty() {
        out.push_str("\nFollowing are the related components / areas referred in the screen for this requirement:\n");
        match serde_json::to_string_pretty(elements) {
            Ok(json) => out.push_str(&json),
            Err(e) => log::warn!("Failed to serialize context elements: {}", e),
        }
        out.push('\n');
    }

    if let Some(screen) = screen {
        if let Some(url) = &screen.relative_url {
            out.push_str(&format!("\nThe screen's relative URL is: {}\n", url));
        }
        if !screen.file_paths.is_empty() {
            screen.push_file_paths(&mut out);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StepKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scenario_prompt_lists_selected_commands() {
        let mut click = CapturedStep::new(
            StepKind::Click,
            vec!["await a.click();".to_string(), "await b.click();".to_string()],
            2,
        );
        click.select_command(1);
        let steps = vec![
            CapturedStep::new(StepKind::Goto, vec!["await page.goto(`/`);".to_string()], 1),
            click,
        ];

        let prompt = format_scenario_prompt("Checkout", &steps);
        assert!(prompt.starts_with("Below is a recorded test scenario"));
        assert!(prompt.ends_with(
            "Test scenario: Checkout\n\nRecorded steps:\n1. await page.goto(`/`);\n2. await b.click();\n"
        ));
    }

    #[test]
    fn test_bug_prompt() {
        let bug = BugReport {
            title: "Save does nothing".to_string(),
            description: String::new(),
            screen: ScreenInfo::new()
                .with_name("Settings")
                .with_relative_url("/settings")
                .with_file_path("src/settings.tsx"),
        };

        assert_eq!(
            format_bug_prompt(&bug),
            "Fix the following bug in the codebase:\n\
             Title: Save does nothing\n\
             Screen: Settings\n\
             Screen relative URL: /settings\n\
             Here are some potential file paths related to the screen:\n\
             - src/settings.tsx\n"
        );
    }

    #[test]
    fn test_dev_task_prompt() {
        let elements = vec![ContextElement {
            id: "el-1".to_string(),
            locator: Some("page.getByTestId(`save`)".to_string()),
            element: None,
            note: None,
        }];
        let screen = ScreenInfo::new().with_relative_url("/settings");

        let prompt = format_dev_task_prompt("Make the button blue", &elements, Some(&screen));
        assert!(prompt.starts_with("# requirement:\nMake the button blue\n"));
        assert!(prompt.contains("\"id\": \"el-1\""));
        assert!(prompt.contains("\"locator\": \"page.getByTestId(`save`)\""));
        assert!(prompt.ends_with("The screen's relative URL is: /settings\n"));

        assert_eq!(format_dev_task_prompt("Do it", &[], None), "# requirement:\nDo it\n");
    }
}
