//! Bridge from a live Chrome tab to a [`CaptureSession`]
//!
//! `recorder.js` installs capture-phase listeners that queue every event
//! together with the target's structural path and a copy of the document
//! taken before page handlers run. Same-origin frames get the same listeners;
//! their events carry the frame's own document and the selectors of the
//! enclosing frame elements. [`PageRecorder::poll`] drains that queue,
//! parses each copy, resolves the target and feeds the session.

use crate::browser::session::{evaluate_json, snapshot_tab};
use crate::capture::{CaptureSession, CapturedStep, DomEvent, EventHost, EventKind, FieldState};
use crate::codegen::{Modifier, MouseButton};
use crate::dom::Page;
use crate::error::{RecorderError, Result};
use headless_chrome::Tab;
use serde::Deserialize;
use std::sync::Arc;

const RECORDER_JS: &str = include_str!("recorder.js");

/// Drains the queue, `null` when the page was replaced since injection
const DRAIN_JS: &str = "window.__stepRecorder ? JSON.stringify(window.__stepRecorder.drain()) : 'null'";

/// An event as queued by the injected script
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub kind: EventKind,
    #[serde(default)]
    pub path: Option<Vec<usize>>,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Enclosing frame selectors, outermost first; empty for the top document
    #[serde(default)]
    pub frames: Vec<String>,
    #[serde(default)]
    pub detail: u32,
    #[serde(default)]
    pub button: i64,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub state: FieldState,
}

impl RawEvent {
    /// The document as it was when the event fired
    pub fn page(&self) -> Page {
        let mut page = Page::parse(&self.html);
        if !self.url.is_empty() {
            page = page.with_url(self.url.clone());
        }
        if !self.title.is_empty() {
            page = page.with_title(self.title.clone());
        }
        page
    }

    /// Resolve the target in `page` and build the typed event
    pub fn to_dom_event<'a>(&self, page: &'a Page) -> Option<DomEvent<'a>> {
        let target = self.path.as_deref().and_then(|path| page.element_at_path(path));

        Some(match self.kind {
            EventKind::Click => DomEvent::Click {
                target: target?,
                detail: self.detail.max(1),
                button: MouseButton::from_code(self.button),
                modifiers: self.modifiers.clone(),
            },
            EventKind::Input => DomEvent::Input {
                target: target?,
                state: self.state.clone(),
            },
            EventKind::Change => DomEvent::Change {
                target: target?,
                state: self.state.clone(),
            },
            EventKind::KeyDown => DomEvent::KeyDown {
                target,
                key: self.key.clone(),
            },
            EventKind::DragStart => DomEvent::DragStart { target: target? },
            EventKind::Drop => DomEvent::Drop { target: target? },
        })
    }
}

/// Event host backed by a Chrome tab
pub struct PageRecorder {
    tab: Arc<Tab>,
}

impl PageRecorder {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn evaluate(&self, expression: &str) -> Result<()> {
        self.tab
            .evaluate(expression, false)
            .map_err(|e| RecorderError::EvaluationFailed(e.to_string()))?;
        Ok(())
    }

    /// Install the recorder script; a no-op if it is already installed
    pub fn inject(&self) -> Result<()> {
        self.evaluate(RECORDER_JS)
    }

    /// Queued events, or `None` when the document was replaced
    fn drain(&self) -> Result<Option<Vec<RawEvent>>> {
        evaluate_json(&self.tab, DRAIN_JS)
    }

    /// Feed queued events to `session` and commit any due fill.
    ///
    /// After a full navigation the script is gone; the session is then asked
    /// to restore, which reinstalls the listeners on the new document.
    pub fn poll(&self, session: &mut CaptureSession) -> Result<Vec<CapturedStep>> {
        let Some(events) = self.drain()? else {
            let page = snapshot_tab(&self.tab)?;
            log::debug!("Document replaced, now on {}", page.url().unwrap_or("<unknown>"));
            session.restore(&page);
            return Ok(Vec::new());
        };

        let mut steps = Vec::new();
        for raw in &events {
            let page = raw.page();
            match raw.to_dom_event(&page) {
                Some(event) => steps.extend(session.handle_frame_event(&page, &raw.frames, event)),
                None => log::debug!("Could not resolve target of {:?} event", raw.kind),
            }
        }
        steps.extend(session.tick());
        Ok(steps)
    }
}

impl EventHost for PageRecorder {
    fn attach(&self, kind: EventKind) -> Result<()> {
        self.inject()?;
        self.evaluate(&format!("window.__stepRecorder.attach('{}')", kind.dom_name()))
    }

    fn detach(&self, kind: EventKind) -> Result<()> {
        self.evaluate(&format!(
            "window.__stepRecorder && window.__stepRecorder.detach('{}')",
            kind.dom_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserSession, LaunchOptions};
    use crate::capture::{CaptureConfig, MemoryStore, StepKind};

    const QUEUED: &str = r#"[{
        "kind": "click",
        "path": [1, 0],
        "html": "<html><head><title>T</title></head><body><button data-testid=\"save\">Save</button></body></html>",
        "url": "https://a.example.com/",
        "title": "T",
        "detail": 1,
        "button": 2,
        "modifiers": ["Shift"],
        "key": "",
        "state": {"value": "", "checked": false, "selected": [], "files": []}
    }, {
        "kind": "keydown",
        "path": null,
        "html": "<html><body></body></html>",
        "key": "Escape"
    }]"#;

    #[test]
    fn test_raw_events_resolve_against_their_copy() {
        let events: Vec<RawEvent> = serde_json::from_str(QUEUED).unwrap();
        assert_eq!(events.len(), 2);

        let page = events[0].page();
        assert_eq!(page.url(), Some("https://a.example.com/"));
        match events[0].to_dom_event(&page).unwrap() {
            DomEvent::Click {
                target,
                button,
                modifiers,
                ..
            } => {
                assert_eq!(target.value().attr("data-testid"), Some("save"));
                assert_eq!(button, MouseButton::Right);
                assert_eq!(modifiers, vec![Modifier::Shift]);
            }
            other => panic!("unexpected event {:?}", other),
        }

        let page = events[1].page();
        assert!(matches!(
            events[1].to_dom_event(&page),
            Some(DomEvent::KeyDown { target: None, .. })
        ));
    }

    #[test]
    fn test_frame_events_resolve_in_the_frame_document() {
        let raw: RawEvent = serde_json::from_str(
            r##"{
                "kind": "click",
                "path": [1, 0],
                "html": "<html><head></head><body><button id=\"pay\">Pay</button></body></html>",
                "url": "https://a.example.com/checkout",
                "frames": ["[name=\"outer\"]", "#card"]
            }"##,
        )
        .unwrap();
        assert_eq!(raw.frames, vec!["[name=\"outer\"]".to_string(), "#card".to_string()]);

        let page = raw.page();
        let Some(DomEvent::Click { target, .. }) = raw.to_dom_event(&page) else {
            panic!("expected a click");
        };
        assert_eq!(target.value().id(), Some("pay"));

        let top: RawEvent = serde_json::from_str(QUEUED).map(|mut events: Vec<RawEvent>| events.remove(0)).unwrap();
        assert!(top.frames.is_empty());
    }

    #[test]
    fn test_unresolvable_target_is_skipped() {
        let raw: RawEvent =
            serde_json::from_str(r#"{"kind": "drop", "path": [4, 4], "html": "<html><body></body></html>"}"#).unwrap();
        let page = raw.page();
        assert!(raw.to_dom_event(&page).is_none());
    }

    #[test]
    #[ignore] // Requires Chrome
    fn test_records_click_in_chrome() {
        let browser = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        browser
            .navigate("data:text/html,<button data-testid='save'>Save</button>")
            .expect("Failed to navigate");
        browser.wait_for_navigation().expect("Failed to wait for navigation");

        let tab = browser.tab().expect("No tab");
        let recorder = Arc::new(PageRecorder::new(tab.clone()));
        let mut session = CaptureSession::new(CaptureConfig::default(), Arc::new(MemoryStore::new()), recorder.clone());
        session.start(&browser.snapshot_page().expect("Failed to snapshot")).expect("Failed to start");

        tab.evaluate("document.querySelector('button').click()", false)
            .expect("Failed to click");
        let steps = recorder.poll(&mut session).expect("Failed to poll");

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind, StepKind::Click);
        assert_eq!(steps[0].commands[0], "await page.getByTestId(`save`).click();");
    }
}
