//! Command and assertion builder
//!
//! Turns locator expressions into Playwright statements, one statement per
//! locator so a reviewer can choose between equivalent variants. An empty
//! locator list yields an empty statement list, never a malformed statement.

pub mod action;
pub mod assertion;
pub mod literal;

pub use action::{Action, ActionKind, ActionValue, ClickOptions, Modifier, MouseButton, SelectValue};
pub use assertion::{Assertion, AssertionKind};
pub use literal::{escape_text, quote};

use crate::dom::{ElementRef, ElementSnapshot, Page};
use crate::locator::generate_locators;
use indexmap::IndexSet;

/// Extra source locators paired with the first target locator in drag and drop
const DRAG_SOURCE_VARIANTS: usize = 2;

/// One action statement per locator
pub fn build_action_commands(locators: &[String], action: &Action) -> Vec<String> {
    locators.iter().map(|locator| action.statement(locator)).collect()
}

/// One assertion statement per locator
pub fn build_assertion_commands(locators: &[String], assertion: &Assertion) -> Vec<String> {
    locators.iter().map(|locator| assertion.statement(locator)).collect()
}

/// Key press statements, or a page-level keyboard press without locators
pub fn build_key_press_commands(locators: &[String], key: &str) -> Vec<String> {
    if key.is_empty() {
        return Vec::new();
    }
    if locators.is_empty() {
        return vec![format!("await page.keyboard.press({});", quote(key))];
    }
    build_action_commands(locators, &Action::Press(key.to_string()))
}

/// Navigation statements with no wait, `networkidle`, and `load`
pub fn build_goto_commands(url: &str) -> Vec<String> {
    let url = quote(url);
    vec![
        format!("await page.goto({});", url),
        format!("await page.goto({}, {{ waitUntil: 'networkidle' }});", url),
        format!("await page.goto({}, {{ waitUntil: 'load' }});", url),
    ]
}

/// Drag-and-drop statements from precomputed source and target locators.
///
/// The first source pairs with every target, then up to two more sources
/// pair with the first target.
pub fn build_drag_drop_from_locators(sources: &[String], targets: &[String]) -> Vec<String> {
    let (Some(first_source), Some(first_target)) = (sources.first(), targets.first()) else {
        return Vec::new();
    };

    let mut commands = IndexSet::new();
    for target in targets {
        commands.insert(format!("await {}.dragTo({});", first_source, target));
    }
    for source in sources.iter().skip(1).take(DRAG_SOURCE_VARIANTS) {
        commands.insert(format!("await {}.dragTo({});", source, first_target));
    }
    commands.into_iter().collect()
}

/// Drag-and-drop statements between two live elements
pub fn build_drag_drop_commands(page: &Page, source: ElementRef<'_>, target: ElementRef<'_>) -> Vec<String> {
    let sources = generate_locators(page, source, false, None);
    let targets = generate_locators(page, target, false, None);
    build_drag_drop_from_locators(&sources, &targets)
}

/// Locators for an element, turned into action statements
pub fn commands_for_element(
    page: &Page,
    element: ElementRef<'_>,
    action: &Action,
    snapshot: Option<&ElementSnapshot>,
) -> Vec<String> {
    let locators = generate_locators(page, element, false, snapshot);
    build_action_commands(&locators, action)
}

/// Locators for an element, turned into assertion statements.
///
/// Text assertions use locators without the visible-text strategy.
pub fn assertions_for_element(
    page: &Page,
    element: ElementRef<'_>,
    assertion: &Assertion,
    snapshot: Option<&ElementSnapshot>,
) -> Vec<String> {
    let locators = generate_locators(page, element, assertion.excludes_text(), snapshot);
    build_assertion_commands(&locators, assertion)
}
