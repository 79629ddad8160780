use crate::codegen::literal::{json_string_list, quote};
use crate::error::{RecorderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder used when a file input change carries no file names
pub const PLACEHOLDER_UPLOAD: &str = "path/to/your-file.ext";

/// Action kinds understood by the command builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Click,
    Dblclick,
    Fill,
    Type,
    Check,
    Uncheck,
    SelectOption,
    Hover,
    Press,
    SetInputFiles,
}

impl ActionKind {
    /// Playwright method name for this kind
    pub fn method(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Dblclick => "dblclick",
            ActionKind::Fill => "fill",
            ActionKind::Type => "type",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::SelectOption => "selectOption",
            ActionKind::Hover => "hover",
            ActionKind::Press => "press",
            ActionKind::SetInputFiles => "setInputFiles",
        }
    }
}

/// Pointer button used for a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Map a DOM `MouseEvent.button` code
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
        }
    }
}

/// Modifier key held during a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Alt,
    Control,
    Meta,
    Shift,
}

impl Modifier {
    fn as_str(self) -> &'static str {
        match self {
            Modifier::Alt => "Alt",
            Modifier::Control => "Control",
            Modifier::Meta => "Meta",
            Modifier::Shift => "Shift",
        }
    }
}

/// Pointer button and modifiers for click actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOptions {
    #[serde(default)]
    pub button: MouseButton,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl ClickOptions {
    /// Create default click options (left button, no modifiers)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the pointer button
    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Builder method: add a held modifier
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    /// JSON argument for the click call, `None` for a plain left click
    pub fn to_argument(&self) -> Option<String> {
        let mut opts = Map::new();
        if self.button != MouseButton::Left {
            opts.insert("button".to_string(), Value::from(self.button.as_str()));
        }
        if !self.modifiers.is_empty() {
            let modifiers: Vec<Value> = self.modifiers.iter().map(|m| Value::from(m.as_str())).collect();
            opts.insert("modifiers".to_string(), Value::Array(modifiers));
        }
        (!opts.is_empty()).then(|| Value::Object(opts).to_string())
    }
}

/// Value selected in a `<select>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectValue {
    Single(String),
    Multiple(Vec<String>),
}

impl SelectValue {
    fn to_argument(&self) -> String {
        match self {
            SelectValue::Single(value) => Value::from(value.as_str()).to_string(),
            SelectValue::Multiple(values) => Value::from(values.clone()).to_string(),
        }
    }
}

/// Loosely-typed action value, as received from an event or a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    Text(String),
    List(Vec<String>),
}

/// An action with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click(ClickOptions),
    DoubleClick(ClickOptions),
    Fill(String),
    Type(String),
    Check,
    Uncheck,
    SelectOption(SelectValue),
    Hover,
    Press(String),
    SetInputFiles(Vec<String>),
}

impl Action {
    /// Validate a kind plus loosely-typed value into an action.
    ///
    /// `fill`, `type` and `press` need a string, `selectOption` a string or a
    /// list. `setInputFiles` accepts either and may be empty.
    pub fn from_kind(kind: ActionKind, value: Option<ActionValue>, options: Option<ClickOptions>) -> Result<Self> {
        let text = |value: Option<ActionValue>| match value {
            Some(ActionValue::Text(text)) => Ok(text),
            _ => Err(RecorderError::InvalidActionValue {
                action: kind.method().to_string(),
                reason: "a string value is required".to_string(),
            }),
        };

        Ok(match kind {
            ActionKind::Click => Action::Click(options.unwrap_or_default()),
            ActionKind::Dblclick => Action::DoubleClick(options.unwrap_or_default()),
            ActionKind::Fill => Action::Fill(text(value)?),
            ActionKind::Type => Action::Type(text(value)?),
            ActionKind::Press => Action::Press(text(value)?),
            ActionKind::Check => Action::Check,
            ActionKind::Uncheck => Action::Uncheck,
            ActionKind::Hover => Action::Hover,
            ActionKind::SelectOption => match value {
                Some(ActionValue::Text(v)) => Action::SelectOption(SelectValue::Single(v)),
                Some(ActionValue::List(v)) => Action::SelectOption(SelectValue::Multiple(v)),
                None => {
                    return Err(RecorderError::InvalidActionValue {
                        action: kind.method().to_string(),
                        reason: "a string or a list of strings is required".to_string(),
                    });
                }
            },
            ActionKind::SetInputFiles => Action::SetInputFiles(match value {
                Some(ActionValue::Text(file)) => vec![file],
                Some(ActionValue::List(files)) => files,
                None => Vec::new(),
            }),
        })
    }

    /// The payload-free kind of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Click(_) => ActionKind::Click,
            Action::DoubleClick(_) => ActionKind::Dblclick,
            Action::Fill(_) => ActionKind::Fill,
            Action::Type(_) => ActionKind::Type,
            Action::Check => ActionKind::Check,
            Action::Uncheck => ActionKind::Uncheck,
            Action::SelectOption(_) => ActionKind::SelectOption,
            Action::Hover => ActionKind::Hover,
            Action::Press(_) => ActionKind::Press,
            Action::SetInputFiles(_) => ActionKind::SetInputFiles,
        }
    }

    /// Render the statement performing this action on `locator`
    pub fn statement(&self, locator: &str) -> String {
        let method = self.kind().method();
        let argument = match self {
            Action::Click(options) | Action::DoubleClick(options) => options.to_argument().unwrap_or_default(),
            Action::Fill(value) | Action::Type(value) | Action::Press(value) => quote(value),
            Action::Check | Action::Uncheck | Action::Hover => String::new(),
            Action::SelectOption(value) => value.to_argument(),
            Action::SetInputFiles(files) => {
                let files: Vec<String> = files
                    .iter()
                    .filter(|f| !f.trim().is_empty())
                    .cloned()
                    .collect();
                if files.is_empty() {
                    json_string_list(&[PLACEHOLDER_UPLOAD.to_string()])
                } else {
                    json_string_list(&files)
                }
            }
        };
        format!("await {}.{}({});", locator, method, argument)
    }
}
