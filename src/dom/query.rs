//! Structural query utilities
//!
//! Primitive DOM inspection used by the locator engine: unique CSS paths,
//! auto-generated id and class detection, SVG detection, and the
//! uniqueness-ensuring variants used when a candidate selector is ambiguous.
//! None of these functions fail; an unusable selector is `None` or empty.

use crate::dom::page::{Page, child_elements, parent_element, tag_name};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::collections::{BTreeMap, HashSet};

/// Test-identifying attributes, highest priority first
pub const TEST_ATTRIBUTES: [&str; 6] = [
    "data-testid",
    "data-test-id",
    "data-test",
    "data-id",
    "data-cy",
    "data-qa",
];

/// Namespace URI of SVG elements
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Most segments in a generated CSS path
const MAX_PATH_SEGMENTS: usize = 5;

/// Most classes kept in a class selector
const MAX_CLASSES: usize = 3;

/// Classes longer than this are treated as generated
const MAX_CLASS_LEN: usize = 40;

/// Ancestor levels shown by a short hierarchy summary
const SHORT_HIERARCHY_LEVELS: usize = 3;

static AUTO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$",
        r"(?i)^[a-f0-9]{8}$",
        r"(?i)^[a-f0-9]{12,}$",
        r"(?i)^react-[a-z0-9]{6,}$",
        r"(?i)^ember[0-9]+$",
        r"(?i)^vue-[a-z0-9]{6,}$",
        r"^:[a-zA-Z0-9_]+:$",
        r"^[0-9]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("auto-generated id regex"))
    .collect()
});

static UTILITY_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^-?(?:",
        r"p|px|py|pt|pb|pl|pr|ps|pe|m|mx|my|mt|mb|ml|mr|ms|me|w|h|size|",
        r"min-w|min-h|max-w|max-h|gap|gap-x|gap-y|space-x|space-y|",
        r"top|left|right|bottom|inset|inset-x|inset-y|z|opacity|order|basis|",
        r"duration|delay|scale|rotate|translate-x|translate-y|",
        r"col-span|row-span|grid-cols|grid-rows|leading|tracking|indent|",
        r"rounded|rounded-t|rounded-b|rounded-l|rounded-r|",
        r"border|border-t|border-b|border-l|border-r|shadow|text|bg|font|",
        r"from|to|via|ring|stroke|fill|outline|divide",
        r")-(?:",
        r"\d+(?:\.\d+)?|\d+/\d+|px|auto|full|screen|min|max|fit|none|",
        r"xs|sm|base|md|lg|xl|\dxl|thin|light|normal|medium|semibold|bold|extrabold|",
        r"tight|snug|relaxed|loose|wide|wider|widest|center|justify|",
        r"white|black|transparent|current|inherit|[a-z]+-\d{2,3}",
        r")$",
    ))
    .expect("utility class regex")
});

static UTILITY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:items|justify|self|place-items|place-content|overflow|overflow-x|overflow-y|",
        r"cursor|whitespace|ease|pointer-events)-[a-z0-9-]+$|",
        r"^flex-(?:row|col|wrap|nowrap|1|auto|initial|none|row-reverse|col-reverse)$",
    ))
    .expect("utility prefix regex")
});

const UTILITY_CLASSES: [&str; 31] = [
    "flex",
    "inline-flex",
    "grid",
    "inline-grid",
    "block",
    "inline-block",
    "inline",
    "hidden",
    "contents",
    "relative",
    "absolute",
    "fixed",
    "sticky",
    "static",
    "container",
    "underline",
    "italic",
    "truncate",
    "uppercase",
    "lowercase",
    "capitalize",
    "grow",
    "shrink",
    "border",
    "rounded",
    "shadow",
    "transition",
    "sr-only",
    "visible",
    "invisible",
    "antialiased",
];

static CSS_IN_JS_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:css|sc|jsx|emotion)-[A-Za-z0-9_-]+$").expect("css-in-js class regex")
});

/// Check whether an id looks human-authored rather than generated.
///
/// Generated shapes are rejected before anything else, so a separator in
/// `react-a8f3k2` does not rescue it.
pub fn is_meaningful_id(id: &str) -> bool {
    let id = id.trim();
    if id.is_empty() {
        return false;
    }
    !AUTO_ID_PATTERNS.iter().any(|p| p.is_match(id))
}

/// The element's id when it is meaningful
pub fn meaningful_id<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    element.value().id().filter(|id| is_meaningful_id(id))
}

fn is_hashed_class(class: &str) -> bool {
    if CSS_IN_JS_CLASS.is_match(class) {
        return true;
    }

    // CSS modules: Component_local__a1B2c
    if let Some((_, hash)) = class.rsplit_once("__") {
        if (5..=8).contains(&hash.len())
            && hash.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && hash.chars().any(|c| c.is_ascii_digit())
        {
            return true;
        }
    }

    let digits = class.chars().filter(char::is_ascii_digit).count();
    let alnum = class.chars().all(|c| c.is_ascii_alphanumeric());

    if let Some(body) = class.strip_prefix('_') {
        if body.len() >= 5 && body.chars().all(|c| c.is_ascii_alphanumeric()) && digits > 0 {
            return true;
        }
    }

    alnum && class.len() >= 6 && digits >= 2 && class.chars().any(|c| c.is_ascii_alphabetic())
}

fn is_utility_class(class: &str) -> bool {
    if class.contains([':', '[', '/', '!']) {
        return true;
    }
    UTILITY_CLASSES.contains(&class) || UTILITY_CLASS.is_match(class) || UTILITY_PREFIX.is_match(class)
}

/// Keep classes that read like hand-written names, at most three
pub fn filter_meaningful_classes<'a, I>(classes: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    classes
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty() && c.len() <= MAX_CLASS_LEN)
        .filter(|c| !is_hashed_class(c) && !is_utility_class(c))
        .filter(|c| seen.insert(*c))
        .take(MAX_CLASSES)
        .collect()
}

/// Build a `.a.b` selector from the element's meaningful classes
pub fn class_selector(element: ElementRef<'_>) -> Option<String> {
    let classes = filter_meaningful_classes(element.value().classes());
    if classes.is_empty() {
        return None;
    }
    Some(
        classes
            .iter()
            .map(|c| format!(".{}", css_escape(c)))
            .collect::<String>(),
    )
}

/// Check whether an element lives in the SVG namespace
pub fn is_svg_element(element: ElementRef<'_>) -> bool {
    &*element.value().name.ns == SVG_NAMESPACE
}

/// First non-empty test attribute on an element, as `(attribute, value)`
pub fn test_attribute(element: ElementRef<'_>) -> Option<(&'static str, String)> {
    TEST_ATTRIBUTES.iter().find_map(|attr| {
        element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (*attr, v.to_string()))
    })
}

/// Escape an identifier for use in a CSS selector
pub fn css_escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, c) in ident.chars().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            c if c.is_ascii_digit() && i == 0 => out.push_str(&format!("\\{:x} ", c as u32)),
            '-' if i == 0 && ident.len() == 1 => out.push_str("\\-"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:x} ", c as u32)),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// `[attr="value"]` with the value quoted for CSS
pub fn attribute_selector(attr: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{}=\"{}\"]", attr, escaped)
}

/// Whether `selector` matches `target` and nothing else
pub fn matches_only(page: &Page, selector: &str, target: ElementRef<'_>) -> bool {
    let matches = page.select(selector);
    matches.len() == 1 && matches[0] == target
}

/// 1-based position of the element among same-tag siblings
pub fn nth_of_type(element: ElementRef<'_>) -> usize {
    let tag = element.value().name();
    let Some(parent) = parent_element(element) else {
        return 1;
    };
    child_elements(parent)
        .filter(|c| c.value().name() == tag)
        .position(|c| c == element)
        .map_or(1, |p| p + 1)
}

fn path_segment(element: ElementRef<'_>) -> String {
    let tag = element.value().name().to_string();
    let same_tag = parent_element(element)
        .map(|p| child_elements(p).filter(|c| c.value().name() == tag).count())
        .unwrap_or(1);
    if same_tag > 1 {
        format!("{}:nth-of-type({})", tag, nth_of_type(element))
    } else {
        tag
    }
}

/// Shortest CSS selector found for the element.
///
/// Prefers a meaningful id, a test attribute and then `tag.classes`, each
/// only when unique. Falls back to a chain of `tag:nth-of-type(k)` segments
/// that stops once unique or at five segments, so the result may still be
/// ambiguous.
pub fn unique_selector(page: &Page, element: ElementRef<'_>) -> Option<String> {
    if let Some(id) = meaningful_id(element) {
        let selector = format!("#{}", css_escape(id));
        if matches_only(page, &selector, element) {
            return Some(selector);
        }
    }

    for attr in TEST_ATTRIBUTES {
        if let Some(value) = element.value().attr(attr).filter(|v| !v.trim().is_empty()) {
            let selector = attribute_selector(attr, value);
            if matches_only(page, &selector, element) {
                return Some(selector);
            }
        }
    }

    if let Some(classes) = class_selector(element) {
        let selector = format!("{}{}", element.value().name(), classes);
        if matches_only(page, &selector, element) {
            return Some(selector);
        }
    }

    let mut segments = vec![path_segment(element)];
    let mut current = element;
    loop {
        let selector = segments.iter().rev().cloned().collect::<Vec<_>>().join(" > ");
        if matches_only(page, &selector, element) || segments.len() >= MAX_PATH_SEGMENTS {
            return Some(selector);
        }

        let Some(parent) = parent_element(current) else {
            return Some(selector);
        };

        if let Some(id) = meaningful_id(parent) {
            let anchor = format!("#{}", css_escape(id));
            if page.count(&anchor) == 1 {
                let anchored = format!("{} > {}", anchor, selector);
                if matches_only(page, &anchored, element) {
                    return Some(anchored);
                }
            }
        }

        segments.push(path_segment(parent));
        current = parent;
    }
}

/// Turn an ambiguous candidate into selectors that identify `target`.
///
/// Returns `[candidate]` when already unique and nothing when the candidate
/// does not match `target`. Otherwise returns the disambiguated variants,
/// always ending with a Playwright `>> nth=` form.
pub fn ensure_unique_selector(page: &Page, candidate: &str, target: ElementRef<'_>) -> Vec<String> {
    let matches = page.select(candidate);
    let Some(index) = matches.iter().position(|m| *m == target) else {
        return Vec::new();
    };
    if matches.len() == 1 {
        return vec![candidate.to_string()];
    }

    let mut variants = Vec::new();

    let nth = format!("{}:nth-of-type({})", candidate, nth_of_type(target));
    if matches_only(page, &nth, target) {
        variants.push(nth);
    }

    let mut ancestor = parent_element(target);
    while let Some(current) = ancestor {
        let scope = meaningful_id(current)
            .map(|id| format!("#{}", css_escape(id)))
            .or_else(|| test_attribute(current).map(|(attr, value)| attribute_selector(attr, &value)));

        if let Some(scope) = scope {
            if page.count(&scope) == 1 {
                let scoped = format!("{} {}", scope, candidate);
                if matches_only(page, &scoped, target) {
                    variants.push(scoped);
                }
                break;
            }
        }
        ancestor = parent_element(current);
    }

    variants.push(format!("{} >> nth={}", candidate, index));
    variants
}

/// `tag#id.class > ...` summary of the element and its ancestors.
///
/// Stops below `<body>`; only three levels unless `full` is set.
pub fn ancestor_hierarchy(element: ElementRef<'_>, full: bool) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let tag = tag_name(el);
        if tag == "body" || tag == "html" {
            break;
        }

        let mut part = tag;
        if let Some(id) = el.value().id() {
            part.push('#');
            part.push_str(id);
        }
        for class in el.value().classes() {
            part.push('.');
            part.push_str(class);
        }
        parts.push(part);

        if !full && parts.len() >= SHORT_HIERARCHY_LEVELS {
            break;
        }
        current = parent_element(el);
    }

    parts.reverse();
    parts.join(" > ")
}

/// Identity and accessibility attributes of an element
pub fn key_attributes(element: ElementRef<'_>) -> BTreeMap<String, String> {
    element
        .value()
        .attrs()
        .filter(|(name, _)| {
            matches!(*name, "id" | "class" | "role" | "name" | "type")
                || name.starts_with("data-")
                || name.starts_with("aria-")
        })
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
