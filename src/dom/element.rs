use indexmap::IndexMap;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Suffixes that mark a captured text value as possibly cut short
pub const TRUNCATION_SUFFIXES: [&str; 2] = ["...", "…"];

/// Structural description of an element captured at interaction time.
///
/// Used when the live node may no longer be attached to the page. Text that
/// ends in a truncation suffix is treated as possibly truncated and is never
/// trusted for exact-text strategies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lowercase tag name (e.g., "button", "input"); empty when unknown
    #[serde(default)]
    pub tag_name: String,

    /// Element attributes (e.g., id, class, data-testid)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text content of the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// `title` attribute captured separately by some hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// `aria-label` attribute captured separately by some hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
}

impl ElementSnapshot {
    /// Create a new ElementSnapshot
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Capture a snapshot from a live element
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let attributes: HashMap<String, String> = value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let text: String = element.text().collect();
        let text = text.trim();

        Self {
            tag_name: value.name().to_ascii_lowercase(),
            title: attributes.get("title").cloned(),
            aria_label: attributes.get("aria-label").cloned(),
            attributes,
            text_content: (!text.is_empty()).then(|| text.to_string()),
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: add a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method: set aria-label
    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    /// Get element ID
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether the captured text looks cut short
    pub fn has_truncated_text(&self) -> bool {
        self.text_content.as_deref().is_some_and(is_truncated_text)
    }
}

/// Check whether a text value ends with a truncation suffix
pub fn is_truncated_text(text: &str) -> bool {
    TRUNCATION_SUFFIXES.iter().any(|suffix| text.ends_with(suffix))
}

/// Lightweight element metadata attached to every captured step
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,

    /// Key attributes, values cut to 50 characters
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Visible text, cut to 50 characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementInfo {
    /// Create a new ElementInfo
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
        }
    }

    /// Render as a short tag string, e.g. `<button id="save">Save</button>`
    pub fn to_simple_string(&self) -> String {
        let mut parts = vec![format!("<{}", self.tag)];

        for key in ["id", "class", "role"] {
            if let Some(value) = self.attributes.get(key) {
                parts.push(format!(" {}=\"{}\"", key, value));
            }
        }

        parts.push(">".to_string());

        if let Some(text) = &self.text {
            parts.push(text.clone());
        }

        parts.push(format!("</{}>", self.tag));
        parts.join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_snapshot_creation() {
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), "save-btn".to_string());
        attrs.insert("class".to_string(), "btn primary".to_string());

        let snapshot = ElementSnapshot::new("BUTTON")
            .with_attributes(attrs)
            .with_text("Save")
            .with_title("Save the document");

        assert_eq!(snapshot.tag_name, "button");
        assert_eq!(snapshot.id(), Some("save-btn"));
        assert!(snapshot.has_class("primary"));
        assert!(!snapshot.has_class("hidden"));
        assert!(snapshot.is_tag("Button"));
        assert_eq!(snapshot.title.as_deref(), Some("Save the document"));
    }

    #[test]
    fn test_truncation_detection() {
        assert!(is_truncated_text("Read the full terms and..."));
        assert!(is_truncated_text("Résumé…"));
        assert!(!is_truncated_text("Submit"));

        let snapshot = ElementSnapshot::new("p").with_text("A long paragraph that was cut...");
        assert!(snapshot.has_truncated_text());
        assert!(!ElementSnapshot::new("p").has_truncated_text());
    }

    #[test]
    fn test_snapshot_from_element() {
        let html = Html::parse_document(
            r#"<button data-testid="submit-btn" title="Send form">  Submit </button>"#,
        );
        let selector = Selector::parse("button").unwrap();
        let element = html.select(&selector).next().unwrap();

        let snapshot = ElementSnapshot::from_element(element);
        assert_eq!(snapshot.tag_name, "button");
        assert_eq!(snapshot.get_attribute("data-testid"), Some("submit-btn"));
        assert_eq!(snapshot.text_content.as_deref(), Some("Submit"));
        assert_eq!(snapshot.title.as_deref(), Some("Send form"));
        assert!(snapshot.aria_label.is_none());
    }

    #[test]
    fn test_snapshot_deserialization_uses_camel_case() {
        let json = r#"{"textContent": "Open menu", "ariaLabel": "Menu", "attributes": {"data-cy": "menu"}}"#;
        let snapshot: ElementSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.tag_name, "");
        assert_eq!(snapshot.text_content.as_deref(), Some("Open menu"));
        assert_eq!(snapshot.aria_label.as_deref(), Some("Menu"));
        assert_eq!(snapshot.get_attribute("data-cy"), Some("menu"));
    }

    #[test]
    fn test_element_info_simple_string() {
        let mut info = ElementInfo::new("button");
        info.attributes.insert("id".to_string(), "save".to_string());
        info.text = Some("Save".to_string());

        assert_eq!(info.to_simple_string(), "<button id=\"save\">Save</button>");
    }
}
