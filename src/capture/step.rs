use crate::dom::ElementInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind tag of a captured step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Click,
    Dblclick,
    Input,
    Select,
    Check,
    Hover,
    Keypress,
    Dragdrop,
    Goto,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepKind::Click => "click",
            StepKind::Dblclick => "dblclick",
            StepKind::Input => "input",
            StepKind::Select => "select",
            StepKind::Check => "check",
            StepKind::Hover => "hover",
            StepKind::Keypress => "keypress",
            StepKind::Dragdrop => "dragdrop",
            StepKind::Goto => "goto",
        };
        f.write_str(name)
    }
}

/// Page and element context recorded with a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementInfo>,
}

/// One recorded interaction: alternative statements plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedStep {
    pub id: Uuid,

    /// Equivalent statements, best locator strategy first
    pub commands: Vec<String>,

    #[serde(default)]
    pub selected_command_index: usize,

    pub kind: StepKind,

    /// Milliseconds since capture started
    pub timestamp_millis: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<StepContext>,
}

impl CapturedStep {
    /// Create a step with a fresh id, selecting the first command
    pub fn new(kind: StepKind, commands: Vec<String>, timestamp_millis: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            commands,
            selected_command_index: 0,
            kind,
            timestamp_millis,
            context: None,
        }
    }

    /// Builder method: attach context
    pub fn with_context(mut self, context: StepContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The selected command, with the index clamped into range
    pub fn selected_command(&self) -> Option<&str> {
        let last = self.commands.len().checked_sub(1)?;
        self.commands
            .get(self.selected_command_index.min(last))
            .map(String::as_str)
    }

    /// Select a command; out-of-range indices clamp to the last command
    pub fn select_command(&mut self, index: usize) {
        self.selected_command_index = index.min(self.commands.len().saturating_sub(1));
    }

    /// Replace the text of one command; `false` when there is no command at `index`
    pub fn edit_command(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.commands.get_mut(index) {
            Some(command) => {
                *command = text.into();
                true
            }
            None => false,
        }
    }

    /// Whether this step carries a page summary
    pub fn has_dom_context(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.dom_context.is_some())
    }
}
