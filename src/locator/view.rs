use crate::dom::page::{Page, tag_name};
use crate::dom::query::is_svg_element;
use crate::dom::{ElementRef, ElementSnapshot};

/// A target element seen through whatever is available: the live node on a
/// parsed page, a snapshot captured earlier, or both.
///
/// Attribute reads prefer the snapshot, since it reflects the element as it
/// was when the user interacted with it.
#[derive(Clone, Copy)]
pub struct ElementView<'a> {
    live: Option<(&'a Page, ElementRef<'a>)>,
    snapshot: Option<&'a ElementSnapshot>,
}

impl<'a> ElementView<'a> {
    /// View a live element, optionally enriched by a snapshot
    pub fn live(page: &'a Page, element: ElementRef<'a>, snapshot: Option<&'a ElementSnapshot>) -> Self {
        Self {
            live: Some((page, element)),
            snapshot,
        }
    }

    /// View a detached element known only by its snapshot
    pub fn detached(snapshot: &'a ElementSnapshot) -> Self {
        Self {
            live: None,
            snapshot: Some(snapshot),
        }
    }

    pub fn page(&self) -> Option<&'a Page> {
        self.live.map(|(page, _)| page)
    }

    pub fn element(&self) -> Option<ElementRef<'a>> {
        self.live.map(|(_, element)| element)
    }

    pub fn snapshot(&self) -> Option<&'a ElementSnapshot> {
        self.snapshot
    }

    /// Lowercase tag name; empty when neither source knows it
    pub fn tag(&self) -> String {
        match (self.element(), self.snapshot) {
            (Some(element), _) => tag_name(element),
            (None, Some(snapshot)) => snapshot.tag_name.to_ascii_lowercase(),
            (None, None) => String::new(),
        }
    }

    /// Attribute value, snapshot first.
    ///
    /// A snapshot's separately captured `title` and `aria-label` count as
    /// attributes.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        if let Some(snapshot) = self.snapshot {
            let captured = match name {
                "title" => snapshot.title.as_deref(),
                "aria-label" => snapshot.aria_label.as_deref(),
                _ => None,
            };
            if let Some(value) = snapshot.get_attribute(name).or(captured) {
                return Some(value);
            }
        }
        self.element().and_then(|el| el.value().attr(name))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whether the element is a form control (`input`, `textarea`, `select`)
    pub fn is_form_control(&self) -> bool {
        matches!(self.tag().as_str(), "input" | "textarea" | "select")
    }

    pub fn is_svg(&self) -> bool {
        self.element().is_some_and(is_svg_element)
    }
}
