//! Accessible-name and visible-text resolution
//!
//! Values are never truncated here. Anything empty or longer than
//! [`MAX_TEXT_LENGTH`] characters resolves to `None` instead.

use crate::dom::element::is_truncated_text;
use crate::dom::page::parent_element;
use crate::dom::query::attribute_selector;
use crate::dom::ElementRef;
use crate::locator::view::ElementView;

/// Longest name or text used in a locator, in characters
pub const MAX_TEXT_LENGTH: usize = 200;

/// Trim, collapse whitespace runs, and reject empty or over-long values
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    let collapsed = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.chars().count() > MAX_TEXT_LENGTH {
        None
    } else {
        Some(collapsed)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn labelledby_text(view: &ElementView<'_>) -> Option<String> {
    let ids = view.attr("aria-labelledby")?;
    let page = view.page()?;
    let text = ids
        .split_whitespace()
        .filter_map(|id| page.element_by_id(id))
        .map(element_text)
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(Some(&text))
}

fn label_text(view: &ElementView<'_>) -> Option<String> {
    let page = view.page()?;
    let element = view.element()?;

    if let Some(id) = element.value().id().filter(|id| !id.is_empty()) {
        let selector = format!("label{}", attribute_selector("for", id));
        if let Some(text) = page.select_first(&selector).and_then(|l| normalize_text(Some(&element_text(l)))) {
            return Some(text);
        }
    }

    let mut ancestor = parent_element(element);
    while let Some(current) = ancestor {
        if current.value().name() == "label" {
            return normalize_text(Some(&element_text(current)));
        }
        ancestor = parent_element(current);
    }
    None
}

/// Accessible name, by priority: `aria-label`, `title`, `alt`,
/// `aria-labelledby`, associated `<label>`, `placeholder` (form controls),
/// then snapshot text.
pub fn accessible_name(view: &ElementView<'_>) -> Option<String> {
    for attr in ["aria-label", "title", "alt"] {
        if let Some(name) = normalize_text(view.attr(attr)) {
            return Some(name);
        }
    }

    if let Some(name) = labelledby_text(view) {
        return Some(name);
    }

    if view.is_form_control() {
        if let Some(name) = label_text(view) {
            return Some(name);
        }
        if let Some(name) = normalize_text(view.attr("placeholder")) {
            return Some(name);
        }
    }

    normalize_text(view.snapshot().and_then(|s| s.text_content.as_deref()))
}

/// The element's full, untruncated text where it can be found.
///
/// Snapshot text is trusted unless it looks truncated; a longer `title` or
/// `aria-label` then wins. Live text is only consulted without snapshot text.
pub fn resolve_full_text(view: &ElementView<'_>) -> Option<String> {
    let snapshot = view.snapshot();
    let snapshot_text = normalize_text(snapshot.and_then(|s| s.text_content.as_deref()));
    if let Some(text) = &snapshot_text {
        if !is_truncated_text(text) {
            return snapshot_text;
        }
    }

    let element_attr = |name: &str| view.element().and_then(|el| el.value().attr(name));
    let candidates = [
        snapshot.and_then(|s| s.title.as_deref()),
        snapshot.and_then(|s| s.aria_label.as_deref()),
        element_attr("title"),
        element_attr("aria-label"),
    ];
    let shortest = snapshot_text.as_ref().map_or(0, |t| t.chars().count());
    for candidate in candidates {
        if let Some(text) = normalize_text(candidate) {
            if snapshot_text.is_none() || text.chars().count() > shortest {
                return Some(text);
            }
        }
    }

    if snapshot_text.is_none() {
        if let Some(live) = view.element().and_then(|el| normalize_text(Some(&element_text(el)))) {
            return Some(live);
        }
    }

    snapshot_text
}

/// Text for an exact-text locator.
///
/// Falls back to the live element's own text nodes when the resolved text
/// looks truncated. A detached element with only truncated text has none.
pub fn visible_text(view: &ElementView<'_>) -> Option<String> {
    let resolved = resolve_full_text(view);
    if let Some(text) = &resolved {
        if !is_truncated_text(text) {
            return resolved;
        }
    }

    let element = view.element()?;
    let own: String = element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect();
    if own.trim().is_empty() {
        normalize_text(Some(&element_text(element)))
    } else {
        normalize_text(Some(&own))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSnapshot, Page};

    fn with_live<R>(html: &str, css: &str, f: impl FnOnce(ElementView<'_>) -> R) -> R {
        let page = Page::parse(html);
        let element = page.select_first(css).unwrap();
        f(ElementView::live(&page, element, None))
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  Save \n  draft ")), Some("Save draft".to_string()));
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some(&"x".repeat(200))).map(|t| t.len()), Some(200));
        assert_eq!(normalize_text(Some(&"x".repeat(201))), None);
        assert!(normalize_text(Some(&"é".repeat(200))).is_some());
    }

    #[test]
    fn test_accessible_name_priority() {
        let name = with_live(r#"<button aria-label="Close" title="Dismiss">X</button>"#, "button", |v| {
            accessible_name(&v)
        });
        assert_eq!(name, Some("Close".to_string()));

        let name = with_live(r#"<img alt="Logo" src="l.png">"#, "img", |v| accessible_name(&v));
        assert_eq!(name, Some("Logo".to_string()));

        let name = with_live(
            r#"<span id="first">Billing</span><span id="second">address</span><div role="group" aria-labelledby="first second"></div>"#,
            "div",
            |v| accessible_name(&v),
        );
        assert_eq!(name, Some("Billing address".to_string()));
    }

    #[test]
    fn test_label_association() {
        let name = with_live(r#"<label for="email">Email address</label><input id="email">"#, "input", |v| {
            accessible_name(&v)
        });
        assert_eq!(name, Some("Email address".to_string()));

        let name = with_live(r#"<label>Remember me <input type="checkbox"></label>"#, "input", |v| {
            accessible_name(&v)
        });
        assert_eq!(name, Some("Remember me".to_string()));

        let name = with_live(r#"<input placeholder="Search products">"#, "input", |v| accessible_name(&v));
        assert_eq!(name, Some("Search products".to_string()));

        let name = with_live(r#"<div placeholder="ignored">x</div>"#, "div", |v| accessible_name(&v));
        assert_eq!(name, None);
    }

    #[test]
    fn test_resolve_full_text_prefers_snapshot() {
        let snapshot = ElementSnapshot::new("button").with_text("Save changes");
        let view = ElementView::detached(&snapshot);
        assert_eq!(resolve_full_text(&view), Some("Save changes".to_string()));
    }

    #[test]
    fn test_truncated_snapshot_uses_longer_attribute() {
        let snapshot = ElementSnapshot::new("a")
            .with_text("Read the full...")
            .with_title("Read the full terms of service");
        let view = ElementView::detached(&snapshot);
        assert_eq!(resolve_full_text(&view), Some("Read the full terms of service".to_string()));
        assert_eq!(visible_text(&view), Some("Read the full terms of service".to_string()));
    }

    #[test]
    fn test_truncated_detached_text_is_not_used() {
        let snapshot = ElementSnapshot::new("p").with_text("A long paragraph that was cut…");
        let view = ElementView::detached(&snapshot);
        assert_eq!(visible_text(&view), None);
    }

    #[test]
    fn test_truncated_snapshot_falls_back_to_live_text() {
        let page = Page::parse(r#"<p>Terms <b>apply</b> in all regions</p>"#);
        let element = page.select_first("p").unwrap();
        let snapshot = ElementSnapshot::new("p").with_text("Terms apply...");
        let view = ElementView::live(&page, element, Some(&snapshot));

        assert_eq!(visible_text(&view), Some("Terms in all regions".to_string()));
    }

    #[test]
    fn test_live_text_without_snapshot() {
        let text = with_live("<button>\n  Add   to cart\n</button>", "button", |v| visible_text(&v));
        assert_eq!(text, Some("Add to cart".to_string()));

        let long = format!("<p>{}</p>", "word ".repeat(60));
        assert_eq!(with_live(&long, "p", |v| visible_text(&v)), None);
    }
}
