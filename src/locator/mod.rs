//! Locator strategy engine
//!
//! Given a target element (a live node on a parsed [`Page`], a captured
//! [`ElementSnapshot`], or both) this module derives every applicable
//! Playwright locator expression. Strategies run in a fixed priority order
//! and all of them contribute, so a reviewer can pick the most readable
//! variant:
//!
//! 1. test attribute (`data-testid`, `data-cy`, ...)
//! 2. role plus accessible name
//! 3. icon/SVG inside a clickable container
//! 4. exact visible text (skipped when `exclude_text` is set)
//! 5. meaningful id
//! 6. form `name`
//! 7. parent-class composition
//! 8. generic CSS path
//! 9. nth index among same-tag elements (index 5 at most)
//! 10. `.first()` of a duplicated CSS path
//! 11. parent-chained disambiguation
//!
//! Identical expressions are emitted once, at their first position. When
//! nothing applies but a CSS path exists, the path is emitted anyway.

pub mod name;
pub mod role;
pub mod view;

use crate::codegen::literal::quote;
use crate::dom::page::{Page, parent_element, tag_name};
use crate::dom::query::{
    attribute_selector, class_selector, css_escape, ensure_unique_selector, is_svg_element, meaningful_id,
    TEST_ATTRIBUTES, unique_selector,
};
use crate::dom::{ElementRef, ElementSnapshot, is_meaningful_id};
use indexmap::IndexMap;
use serde::Serialize;

pub use name::{accessible_name, normalize_text, resolve_full_text, visible_text, MAX_TEXT_LENGTH};
pub use role::effective_role;
pub use view::ElementView;

/// Highest 0-based index that still earns an nth locator
pub const MAX_NTH_INDEX: usize = 5;

/// Ancestor levels searched for a parent with meaningful classes
pub const PARENT_SEARCH_LEVELS: usize = 3;

/// The strategy that produced a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    TestAttribute,
    RoleName,
    IconContainer,
    Text,
    Id,
    FormName,
    ParentClass,
    CssPath,
    NthIndex,
    First,
    ParentChain,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::TestAttribute => "test-attribute",
            Strategy::RoleName => "role-name",
            Strategy::IconContainer => "icon-container",
            Strategy::Text => "text",
            Strategy::Id => "id",
            Strategy::FormName => "form-name",
            Strategy::ParentClass => "parent-class",
            Strategy::CssPath => "css-path",
            Strategy::NthIndex => "nth-index",
            Strategy::First => "first",
            Strategy::ParentChain => "parent-chain",
        };
        f.write_str(name)
    }
}

/// A locator expression tagged with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorCandidate {
    pub strategy: Strategy,
    pub expression: String,
}

/// Ordered, deduplicated collection of candidates
#[derive(Default)]
struct Candidates {
    seen: IndexMap<String, Strategy>,
}

impl Candidates {
    fn add(&mut self, strategy: Strategy, expression: String) {
        self.seen.entry(expression).or_insert(strategy);
    }

    fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn into_vec(self) -> Vec<LocatorCandidate> {
        self.seen
            .into_iter()
            .map(|(expression, strategy)| LocatorCandidate { strategy, expression })
            .collect()
    }
}

fn css_locator(selector: &str) -> String {
    format!("page.locator({})", quote(selector))
}

/// Generate locator expressions for a live element, best first.
///
/// `snapshot`, when given, describes the element as it was at interaction
/// time and takes priority for attributes and text.
pub fn generate_locators(
    page: &Page,
    element: ElementRef<'_>,
    exclude_text: bool,
    snapshot: Option<&ElementSnapshot>,
) -> Vec<String> {
    expressions(generate_candidates(page, element, exclude_text, snapshot))
}

/// Generate locator expressions for a detached element known only by its
/// snapshot. Only attribute, role and text strategies apply.
pub fn generate_snapshot_locators(snapshot: &ElementSnapshot, exclude_text: bool) -> Vec<String> {
    expressions(run_strategies(ElementView::detached(snapshot), exclude_text))
}

/// Like [`generate_locators`], keeping the strategy of each expression
pub fn generate_candidates(
    page: &Page,
    element: ElementRef<'_>,
    exclude_text: bool,
    snapshot: Option<&ElementSnapshot>,
) -> Vec<LocatorCandidate> {
    run_strategies(ElementView::live(page, element, snapshot), exclude_text)
}

fn expressions(candidates: Vec<LocatorCandidate>) -> Vec<String> {
    candidates.into_iter().map(|c| c.expression).collect()
}

fn run_strategies(view: ElementView<'_>, exclude_text: bool) -> Vec<LocatorCandidate> {
    let mut out = Candidates::default();

    test_attribute_strategy(&view, &mut out);
    role_strategy(&view, &mut out);
    if let (Some(page), Some(element)) = (view.page(), view.element()) {
        icon_container_strategy(page, element, &mut out);
    }
    if !exclude_text {
        if let Some(text) = visible_text(&view) {
            out.add(Strategy::Text, format!("page.getByText({}, {{ exact: true }})", quote(&text)));
        }
    }
    if let Some(id) = view.attr("id").filter(|id| is_meaningful_id(id)) {
        out.add(Strategy::Id, css_locator(&format!("#{}", css_escape(id))));
    }
    if view.is_form_control() {
        if let Some(name) = view.attr("name").filter(|n| !n.is_empty()) {
            out.add(Strategy::FormName, css_locator(&attribute_selector("name", name)));
        }
    }

    let (Some(page), Some(element)) = (view.page(), view.element()) else {
        return out.into_vec();
    };

    parent_class_strategy(page, element, &mut out);

    let css = unique_selector(page, element);
    if let Some(css) = &css {
        out.add(Strategy::CssPath, css_locator(css));
    }

    let tag = tag_name(element);
    let same_tag = page.select(&tag);
    if same_tag.len() > 1 {
        if let Some(index) = same_tag.iter().position(|e| *e == element) {
            if index <= MAX_NTH_INDEX {
                out.add(Strategy::NthIndex, format!("{}.nth({})", css_locator(&tag), index));
            }
        }
    }

    if let Some(css) = &css {
        let matches = page.select(css);
        if matches.len() > 1 {
            if matches[0] == element {
                out.add(Strategy::First, format!("{}.first()", css_locator(css)));
            }
            if let Some(parent) = parent_selector(element) {
                out.add(Strategy::ParentChain, css_locator(&format!("{} > {}", parent, tag)));
            }
        }

        if out.is_empty() {
            out.add(Strategy::CssPath, css_locator(css));
        }
    }

    out.into_vec()
}

fn test_attribute_strategy(view: &ElementView<'_>, out: &mut Candidates) {
    for attr in TEST_ATTRIBUTES {
        let Some(value) = view.attr(attr).map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let expression = if attr == "data-testid" {
            format!("page.getByTestId({})", quote(value))
        } else {
            css_locator(&attribute_selector(attr, value))
        };
        out.add(Strategy::TestAttribute, expression);
        return;
    }
}

fn role_strategy(view: &ElementView<'_>, out: &mut Candidates) {
    let Some(role) = effective_role(view) else {
        return;
    };
    if let Some(name) = accessible_name(view).or_else(|| visible_text(view)) {
        out.add(
            Strategy::RoleName,
            format!("page.getByRole({}, {{ name: {} }})", quote(&role), quote(&name)),
        );
    }
}

/// Clickable elements: `<button>`, `role=button`, or an `onclick` handler
fn is_clickable(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "button" || value.attr("role") == Some("button") || value.attr("onclick").is_some()
}

/// SVG tag names from `element` up to, not including, `stop_at`
fn svg_path(element: ElementRef<'_>, stop_at: ElementRef<'_>) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = Some(element);
    while let Some(el) = current {
        if el == stop_at {
            break;
        }
        if is_svg_element(el) {
            path.push(el.value().name().to_string());
        }
        current = parent_element(el);
    }
    path.reverse();
    path
}

/// The first non-SVG ancestor of an SVG element
fn svg_container(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut current = parent_element(element);
    while let Some(el) = current {
        if !is_svg_element(el) {
            return Some(el);
        }
        current = parent_element(el);
    }
    None
}

fn icon_container_strategy(page: &Page, element: ElementRef<'_>, out: &mut Candidates) {
    if !is_svg_element(element) {
        return;
    }
    let Some(container) = svg_container(element).filter(|c| is_clickable(*c)) else {
        return;
    };
    let Some(classes) = class_selector(container) else {
        return;
    };

    let candidate = format!("{} > {}", classes, svg_path(element, container).join(" > "));
    for selector in ensure_unique_selector(page, &candidate, element) {
        out.add(Strategy::IconContainer, css_locator(&selector));
    }
}

/// Nearest ancestor, within three levels, with a meaningful id or classes
fn parent_with_classes(element: ElementRef<'_>) -> Option<(ElementRef<'_>, String)> {
    let mut parent = parent_element(element);
    for _ in 0..PARENT_SEARCH_LEVELS {
        let current = parent?;
        if let Some(classes) = class_selector(current) {
            let selector = match meaningful_id(current) {
                Some(id) => format!("#{}", css_escape(id)),
                None => classes,
            };
            return Some((current, selector));
        }
        parent = parent_element(current);
    }
    None
}

fn parent_class_strategy(page: &Page, element: ElementRef<'_>, out: &mut Candidates) {
    let svg = is_svg_element(element);
    if !svg && class_selector(element).is_some() {
        return;
    }
    let Some((parent, selector)) = parent_with_classes(element) else {
        return;
    };

    let mut variants = vec![format!("{} > {}", selector, tag_name(element))];
    if svg {
        let path = svg_path(element, parent);
        if path.len() > 1 {
            variants.push(format!("{} > {}", selector, path.join(" > ")));
        }
    }

    for variant in variants {
        for unique in ensure_unique_selector(page, &variant, element) {
            out.add(Strategy::ParentClass, css_locator(&unique));
        }
    }
}

/// Selector for the element's parent: meaningful id, `data-testid`,
/// meaningful classes, then `role`
pub fn parent_selector(element: ElementRef<'_>) -> Option<String> {
    let parent = parent_element(element)?;
    if let Some(id) = meaningful_id(parent) {
        return Some(format!("#{}", css_escape(id)));
    }
    if let Some(test_id) = parent.value().attr("data-testid") {
        return Some(attribute_selector("data-testid", test_id));
    }
    if let Some(classes) = class_selector(parent) {
        return Some(classes);
    }
    parent.value().attr("role").map(|role| attribute_selector("role", role))
}

/// Re-root a `page.` locator inside nested frames, outermost first.
///
/// `page.getByText(`Pay`)` inside `#checkout` becomes
/// `page.frameLocator(`#checkout`).getByText(`Pay`)`.
pub fn scope_to_frames(locator: &str, frames: &[String]) -> String {
    let Some(rest) = locator.strip_prefix("page.") else {
        return locator.to_string();
    };
    let mut scoped = String::from("page");
    for frame in frames {
        scoped.push_str(&format!(".frameLocator({})", quote(frame)));
    }
    format!("{}.{}", scoped, rest)
}
