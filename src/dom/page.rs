use crate::dom::element::ElementInfo;
use scraper::{ElementRef, Html, Selector};

/// Attributes kept in [`ElementInfo`], in capture order
const KEY_ATTRIBUTES: [&str; 9] = [
    "id",
    "class",
    "type",
    "name",
    "value",
    "placeholder",
    "aria-label",
    "role",
    "data-testid",
];

/// Longest attribute or text value kept in [`ElementInfo`]
const MAX_INFO_VALUE_LEN: usize = 50;

const INTERACTIVE_SELECTOR: &str = "button, a, input, select, textarea, [role=\"button\"]";
const LANDMARK_SELECTOR: &str = "main, nav, header, footer";
const MAX_CONTEXT_ELEMENTS: usize = 50;
const MAX_CONTEXT_LABEL_LEN: usize = 30;

/// A parsed page: the document plus the location it was captured from.
///
/// Every locator and uniqueness check runs against this structure, so the
/// same `Page` always yields the same results.
#[derive(Debug, Clone)]
pub struct Page {
    html: Html,
    url: Option<String>,
    title: Option<String>,
}

impl Page {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            url: None,
            title: None,
        }
    }

    /// Builder method: set the page URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method: override the page title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// URL the page was captured from
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Page title: the explicit title, else the document `<title>`
    pub fn title(&self) -> Option<String> {
        if let Some(title) = &self.title {
            return Some(title.clone());
        }
        self.select_first("title")
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Underlying parsed document
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The document element (`<html>`)
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// All elements matching a CSS selector, in document order.
    ///
    /// An unparsable selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(e) => {
                log::debug!("Unparsable selector '{}': {:?}", css, e);
                Vec::new()
            }
        }
    }

    /// First element matching a CSS selector
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.html.select(&selector).next()
    }

    /// Number of elements matching a CSS selector
    pub fn count(&self, css: &str) -> usize {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).count(),
            Err(_) => 0,
        }
    }

    /// Find an element by its `id` attribute without building a selector
    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.elements().find(|el| el.value().id() == Some(id))
    }

    /// Iterate every element in document order
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap)
    }

    /// Count total elements in the document
    pub fn count_elements(&self) -> usize {
        self.elements().count()
    }

    /// Resolve an element from child-element indices starting at `<html>`
    pub fn element_at_path(&self, path: &[usize]) -> Option<ElementRef<'_>> {
        let mut current = self.root();
        for &index in path {
            current = child_elements(current).nth(index)?;
        }
        Some(current)
    }

    /// Child-element indices leading from `<html>` to `element`
    pub fn path_of(&self, element: ElementRef<'_>) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = element;
        while let Some(parent) = parent_element(current) {
            let index = child_elements(parent)
                .position(|c| c == current)
                .unwrap_or_default();
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Capture lightweight metadata about an element
    pub fn element_info(&self, element: ElementRef<'_>) -> ElementInfo {
        let value = element.value();
        let mut info = ElementInfo::new(value.name().to_ascii_lowercase());

        for key in KEY_ATTRIBUTES {
            if let Some(attr) = value.attr(key).filter(|v| !v.is_empty()) {
                info.attributes
                    .insert(key.to_string(), truncate_with_ellipsis(attr, MAX_INFO_VALUE_LEN, 47));
            }
        }

        let text: String = element.text().collect();
        let text = text.trim();
        if !text.is_empty() {
            info.text = Some(truncate_with_ellipsis(text, MAX_INFO_VALUE_LEN, MAX_INFO_VALUE_LEN));
        }

        info
    }

    /// Compact summary of the page's landmarks and interactive elements
    pub fn dom_context(&self, max_len: usize) -> String {
        let landmark = self
            .select_first(LANDMARK_SELECTOR)
            .map(|el| el.value().name().to_ascii_uppercase())
            .unwrap_or_else(|| "none".to_string());

        let elements: Vec<String> = self
            .select(INTERACTIVE_SELECTOR)
            .into_iter()
            .take(MAX_CONTEXT_ELEMENTS)
            .map(|el| {
                let tag = el.value().name().to_ascii_lowercase();
                let role = el
                    .value()
                    .attr("role")
                    .map(|r| format!(" role=\"{}\"", r))
                    .unwrap_or_default();
                let label = el
                    .value()
                    .attr("aria-label")
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        let text: String = el.text().collect();
                        text.trim().chars().take(MAX_CONTEXT_LABEL_LEN).collect()
                    });
                format!("<{tag}{role}>{label}</{tag}>")
            })
            .collect();

        let context = format!("Page landmarks: {}\n{}", landmark, elements.join("\n"));
        context.chars().take(max_len).collect()
    }
}

/// Parent element, if the element is not the document element
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Child elements, skipping text and comment nodes
pub fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Lowercase tag name of an element
pub fn tag_name(element: ElementRef<'_>) -> String {
    element.value().name().to_ascii_lowercase()
}

/// Cut `value` to `keep` characters plus `...` when it exceeds `max` characters
pub fn truncate_with_ellipsis(value: &str, max: usize, keep: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let kept: String = value.chars().take(keep).collect();
        format!("{}...", kept)
    }
}
