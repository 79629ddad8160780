//! Typed page events fed to a capture session

use crate::codegen::{Modifier, MouseButton};
use crate::dom::page::tag_name;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};

/// Listener kinds a capture session registers on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Input,
    Change,
    KeyDown,
    DragStart,
    Drop,
}

impl EventKind {
    /// Every kind attached while capturing
    pub const CAPTURED: [EventKind; 6] = [
        EventKind::Click,
        EventKind::Input,
        EventKind::Change,
        EventKind::KeyDown,
        EventKind::DragStart,
        EventKind::Drop,
    ];

    /// DOM event type name
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::KeyDown => "keydown",
            EventKind::DragStart => "dragstart",
            EventKind::Drop => "drop",
        }
    }
}

/// Form field state read from the event target when the event fired
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldState {
    pub value: String,
    pub checked: bool,
    /// Values of the selected `<option>`s
    pub selected: Vec<String>,
    /// Names of the chosen files
    pub files: Vec<String>,
}

impl FieldState {
    /// Read state from markup: `value`/`checked` attributes, `selected`
    /// options, or a `<textarea>`'s text
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let mut state = FieldState {
            checked: value.attr("checked").is_some(),
            ..Default::default()
        };

        match tag_name(element).as_str() {
            "textarea" => state.value = element.text().collect(),
            "select" => {
                state.selected = element
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|option| tag_name(*option) == "option" && option.value().attr("selected").is_some())
                    .map(|option| {
                        option
                            .value()
                            .attr("value")
                            .map(str::to_string)
                            .unwrap_or_else(|| option.text().collect::<String>().trim().to_string())
                    })
                    .collect();
                state.value = state.selected.first().cloned().unwrap_or_default();
            }
            _ => state.value = value.attr("value").unwrap_or_default().to_string(),
        }
        state
    }

    /// Builder method: set the value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Builder method: set the checked flag
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Builder method: set the selected option values
    pub fn with_selected(mut self, selected: Vec<String>) -> Self {
        self.selected = selected;
        self
    }

    /// Builder method: set the chosen file names
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }
}

/// An event observed on a page, with its target resolved in a parsed page
#[derive(Debug, Clone)]
pub enum DomEvent<'a> {
    Click {
        target: ElementRef<'a>,
        /// Click count, 2 for the second click of a double click
        detail: u32,
        button: MouseButton,
        modifiers: Vec<Modifier>,
    },
    Input {
        target: ElementRef<'a>,
        state: FieldState,
    },
    Change {
        target: ElementRef<'a>,
        state: FieldState,
    },
    KeyDown {
        /// `None` when the key went to the document itself
        target: Option<ElementRef<'a>>,
        key: String,
    },
    DragStart {
        target: ElementRef<'a>,
    },
    Drop {
        target: ElementRef<'a>,
    },
    /// Never recorded
    Hover {
        target: ElementRef<'a>,
    },
}

impl<'a> DomEvent<'a> {
    /// A plain left click
    pub fn click(target: ElementRef<'a>) -> Self {
        DomEvent::Click {
            target,
            detail: 1,
            button: MouseButton::Left,
            modifiers: Vec::new(),
        }
    }

    /// An input event carrying a new text value
    pub fn input(target: ElementRef<'a>, value: impl Into<String>) -> Self {
        DomEvent::Input {
            target,
            state: FieldState::default().with_value(value),
        }
    }

    /// A change event with the state currently in the markup
    pub fn change(target: ElementRef<'a>) -> Self {
        DomEvent::Change {
            target,
            state: FieldState::from_element(target),
        }
    }

    pub fn key_down(target: Option<ElementRef<'a>>, key: impl Into<String>) -> Self {
        DomEvent::KeyDown { target, key: key.into() }
    }

    /// The element the event was dispatched to
    pub fn target(&self) -> Option<ElementRef<'a>> {
        match self {
            DomEvent::Click { target, .. }
            | DomEvent::Input { target, .. }
            | DomEvent::Change { target, .. }
            | DomEvent::DragStart { target }
            | DomEvent::Drop { target }
            | DomEvent::Hover { target } => Some(*target),
            DomEvent::KeyDown { target, .. } => *target,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Click { .. } => "click",
            DomEvent::Input { .. } => "input",
            DomEvent::Change { .. } => "change",
            DomEvent::KeyDown { .. } => "keydown",
            DomEvent::DragStart { .. } => "dragstart",
            DomEvent::Drop { .. } => "drop",
            DomEvent::Hover { .. } => "hover",
        }
    }
}
