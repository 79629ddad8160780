use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use step_recorder::capture::{CaptureConfig, CaptureSession, DomEvent, InMemoryHost, ManualClock, MemoryStore, StepKind};
use step_recorder::dom::Page;
use step_recorder::locator::{MAX_TEXT_LENGTH, Strategy as LocatorStrategy, generate_candidates, generate_locators};

const TAGS: [&str; 7] = ["button", "a", "span", "div", "h2", "p", "label"];

#[derive(Debug, Clone)]
struct Fixture {
    html: String,
    test_id: Option<String>,
    text: String,
}

fn fixture() -> impl Strategy<Value = Fixture> {
    (
        prop::sample::select(TAGS.to_vec()),
        proptest::option::of("[a-z][a-z0-9-]{0,12}"),
        proptest::option::of("[a-z]{3,10}"),
        "[a-zA-Z ]{0,260}",
        0usize..3,
    )
        .prop_map(|(tag, test_id, class, text, copies)| {
            let mut attrs = String::new();
            if let Some(id) = &test_id {
                attrs.push_str(&format!(r#" data-testid="{}""#, id));
            }
            if let Some(class) = &class {
                attrs.push_str(&format!(r#" class="{}""#, class));
            }
            let element = format!("<{tag} id=\"target\"{attrs}>{text}</{tag}>");
            let sibling = format!("<{tag}{attrs}>{text}</{tag}>");
            let html = format!(
                "<html><body><main><section>{}{}</section></main></body></html>",
                element,
                sibling.repeat(copies)
            );
            Fixture { html, test_id, text }
        })
}

fn normalized_len(text: &str) -> usize {
    text.split_whitespace().collect::<Vec<_>>().join(" ").chars().count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn locators_have_no_duplicates(f in fixture()) {
        let page = Page::parse(&f.html);
        let target = page.element_by_id("target").unwrap();
        let locators = generate_locators(&page, target, false, None);

        let unique: HashSet<&String> = locators.iter().collect();
        prop_assert_eq!(unique.len(), locators.len());
    }

    #[test]
    fn test_id_is_first_and_single(f in fixture()) {
        let page = Page::parse(&f.html);
        let target = page.element_by_id("target").unwrap();
        let candidates = generate_candidates(&page, target, false, None);

        if let Some(test_id) = f.test_id.as_deref() {
            prop_assert_eq!(candidates[0].strategy, LocatorStrategy::TestAttribute);
            prop_assert_eq!(&candidates[0].expression, &format!("page.getByTestId(`{}`)", test_id));
            prop_assert_eq!(
                candidates.iter().filter(|c| c.strategy == LocatorStrategy::TestAttribute).count(),
                1
            );
        }
    }

    #[test]
    fn long_text_never_yields_text_locator(f in fixture()) {
        let page = Page::parse(&f.html);
        let target = page.element_by_id("target").unwrap();
        let candidates = generate_candidates(&page, target, false, None);

        if normalized_len(&f.text) > MAX_TEXT_LENGTH {
            prop_assert!(candidates.iter().all(|c| c.strategy != LocatorStrategy::Text));
            prop_assert!(!candidates.iter().any(|c| c.expression.starts_with("page.getByText(")));
        }
    }

    #[test]
    fn exclude_text_removes_text_locator(f in fixture()) {
        let page = Page::parse(&f.html);
        let target = page.element_by_id("target").unwrap();

        let with_text = generate_candidates(&page, target, false, None);
        let without = generate_locators(&page, target, true, None);
        for text_locator in with_text.iter().filter(|c| c.strategy == LocatorStrategy::Text) {
            prop_assert!(!without.contains(&text_locator.expression));
        }
    }

    #[test]
    fn generation_is_idempotent(f in fixture()) {
        let page = Page::parse(&f.html);
        let target = page.element_by_id("target").unwrap();

        prop_assert_eq!(
            generate_locators(&page, target, false, None),
            generate_locators(&page, target, false, None)
        );
    }

    #[test]
    fn keystrokes_debounce_into_one_fill(
        value in "[a-z]{1,16}",
        gaps in prop::collection::vec(0u64..1000, 16),
    ) {
        let page = Page::parse(r#"<form><input id="q" name="q"></form>"#);
        let input = page.element_by_id("q").unwrap();
        let clock = Arc::new(ManualClock::new(1_000_000));
        let mut session = CaptureSession::new(
            CaptureConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(InMemoryHost::new()),
        )
        .with_clock(clock.clone());
        session.start(&page).unwrap();

        let mut emitted = Vec::new();
        for (i, gap) in gaps.iter().take(value.len()).enumerate() {
            emitted.extend(session.handle_event(&page, DomEvent::input(input, &value[..=i])));
            clock.advance(*gap);
            emitted.extend(session.tick());
        }
        clock.advance(1000);
        emitted.extend(session.tick());

        prop_assert_eq!(emitted.len(), 1);
        prop_assert_eq!(emitted[0].kind, StepKind::Input);
        prop_assert_eq!(&emitted[0].commands[0], &format!("await page.locator(`#q`).fill(`{}`);", value));
        prop_assert_eq!(session.steps().len(), 1);
    }
}
