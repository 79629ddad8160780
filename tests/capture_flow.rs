use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use step_recorder::capture::store::KEY_STEPS;
use step_recorder::capture::{
    CaptureConfig, CaptureNotice, CaptureSession, CaptureState, CaptureStatus, CaptureStore, DomEvent, InMemoryHost,
    JsonFileStore, ManualClock, MemoryStore, PlaywrightFileWriter, StepKind,
};
use step_recorder::dom::Page;
use step_recorder::{RecorderError, Result};

const LOGIN: &str = r#"
<html>
  <head><title>Sign in</title></head>
  <body>
    <form>
      <label for="user">Username</label>
      <input id="user" name="user">
      <input id="remember" type="checkbox">
      <button data-testid="login-btn" type="submit">Log in</button>
    </form>
  </body>
</html>"#;

const DASHBOARD: &str = r#"
<html>
  <head><title>Dashboard</title></head>
  <body><button data-testid="logout">Log out</button></body>
</html>"#;

fn session(store: Arc<dyn CaptureStore>, clock: Arc<ManualClock>) -> CaptureSession {
    CaptureSession::new(CaptureConfig::default(), store, Arc::new(InMemoryHost::new())).with_clock(clock)
}

#[test]
fn records_a_login_flow_into_a_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("capture.json")));
    let clock = Arc::new(ManualClock::new(10_000));
    let mut session = session(store.clone(), clock.clone());

    let page = Page::parse(LOGIN).with_url("https://app.example.com/login");
    session.start(&page).unwrap();

    let user = page.element_by_id("user").unwrap();
    for value in ["a", "ad", "adm", "admin"] {
        session.handle_event(&page, DomEvent::input(user, value));
        clock.advance(120);
    }
    let remember = page.element_by_id("remember").unwrap();
    session.handle_event(&page, DomEvent::click(remember));
    let button = page.select_first("[data-testid=login-btn]").unwrap();
    session.handle_event(&page, DomEvent::click(button));

    let steps = session.steps();
    let kinds: Vec<StepKind> = steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Goto, StepKind::Input, StepKind::Click]);
    assert_eq!(steps[0].commands[0], "await page.goto(`https://app.example.com/login`);");
    assert_eq!(steps[0].commands.len(), 3);
    assert_eq!(
        steps[1].commands[0],
        "await page.getByRole(`textbox`, { name: `Username` }).fill(`admin`);"
    );
    assert_eq!(steps[2].commands[0], "await page.getByTestId(`login-btn`).click();");

    let first = steps[0].context.as_ref().unwrap();
    assert_eq!(first.page_title.as_deref(), Some("Sign in"));
    assert!(first.dom_context.is_some());

    // the file is the source of truth: a fresh store sees the same sequence
    let reopened = CaptureState::new(Arc::new(JsonFileStore::new(store.path())));
    assert!(reopened.is_active());
    assert_eq!(reopened.steps(), steps);
    assert_eq!(reopened.origin_url().as_deref(), Some("https://app.example.com/login"));
}

#[test]
fn capture_survives_a_same_site_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.json");
    let clock = Arc::new(ManualClock::new(0));

    let login = Page::parse(LOGIN).with_url("https://app.example.com/login");
    let mut before = session(Arc::new(JsonFileStore::new(&path)), clock.clone());
    before.start(&login).unwrap();
    before.handle_event(&login, DomEvent::click(login.select_first("button").unwrap()));
    assert_eq!(before.steps().len(), 2);
    drop(before);

    // a full page load builds a new session on the same store
    let dashboard = Page::parse(DASHBOARD).with_url("https://app.example.com/home");
    let mut after = session(Arc::new(JsonFileStore::new(&path)), clock.clone());
    let mut notices = after.subscribe();
    assert!(after.restore(&dashboard));
    assert_eq!(after.status(), CaptureStatus::Capturing);
    match notices.try_recv().unwrap() {
        CaptureNotice::Restored { steps } => assert_eq!(steps.len(), 2),
        other => panic!("unexpected notice {:?}", other),
    }

    clock.advance(5_000);
    let logout = dashboard.select_first("button").unwrap();
    let steps = after.handle_event(&dashboard, DomEvent::click(logout));
    assert_eq!(steps.len(), 1);

    let stored = after.steps();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].commands[0], "await page.getByTestId(`logout`).click();");
    let context = stored[2].context.as_ref().unwrap();
    assert_eq!(context.page_url.as_deref(), Some("https://app.example.com/home"));
    assert_eq!(context.page_title.as_deref(), Some("Dashboard"));
}

#[test]
fn leaving_the_site_clears_capture() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.json");
    let clock = Arc::new(ManualClock::new(0));

    let login = Page::parse(LOGIN).with_url("https://app.example.com/login");
    let mut before = session(Arc::new(JsonFileStore::new(&path)), clock.clone());
    before.start(&login).unwrap();
    drop(before);

    let elsewhere = Page::parse(DASHBOARD).with_url("https://other.example.org/");
    let store = Arc::new(JsonFileStore::new(&path));
    let mut after = session(store.clone(), clock);
    assert!(!after.restore(&elsewhere));
    assert_eq!(after.status(), CaptureStatus::Idle);

    let state = CaptureState::new(store);
    assert!(!state.is_active());
    assert!(state.steps().is_empty());
    assert_eq!(state.origin_url(), None);
}

#[test]
fn review_then_write_a_playwright_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("capture.json")));
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session(store, clock.clone());

    let page = Page::parse(LOGIN).with_url("https://app.example.com/login");
    session.start(&page).unwrap();
    session.handle_event(&page, DomEvent::change(page.element_by_id("user").unwrap()));
    clock.advance(2_000);
    let button = page.select_first("button").unwrap();
    session.handle_event(&page, DomEvent::click(button));
    session.stop().unwrap();
    assert_eq!(session.status(), CaptureStatus::Reviewing);

    // empty value change still produces a fill; drop it during review
    assert_eq!(session.steps()[1].kind, StepKind::Input);
    session.delete_step(1).unwrap();
    session.select_command(1, 1).unwrap();
    let chosen = session.steps()[1].selected_command().unwrap().to_string();

    let writer = PlaywrightFileWriter::new(dir.path().join("e2e"));
    let location = session.create_test("Log in as admin", &writer).unwrap();
    assert_eq!(location, writer.path_for("Log in as admin").display().to_string());

    let content = std::fs::read_to_string(writer.path_for("Log in as admin")).unwrap();
    assert_eq!(
        content,
        format!(
            "import {{ test, expect }} from '@playwright/test';\n\n\
             test(\"Log in as admin\", async ({{ page }}) => {{\n  \
             await page.goto(`https://app.example.com/login`);\n  {}\n}});\n",
            chosen
        )
    );

    assert_eq!(session.status(), CaptureStatus::Idle);
    assert!(session.steps().is_empty());
}

#[test]
fn deletion_during_capture_is_not_overwritten() {
    let store: Arc<dyn CaptureStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session(store.clone(), clock.clone());

    let page = Page::parse(DASHBOARD).with_url("https://app.example.com/home");
    session.start(&page).unwrap();
    session.handle_event(&page, DomEvent::click(page.select_first("button").unwrap()));
    assert_eq!(session.steps().len(), 2);

    // a review surface removes the goto step behind the session's back
    let review = CaptureState::new(store);
    review
        .update_steps(|steps| {
            steps.remove(0);
        })
        .unwrap();

    clock.advance(5_000);
    session.handle_event(&page, DomEvent::key_down(None, "Escape"));

    let steps = session.steps();
    let kinds: Vec<StepKind> = steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Click, StepKind::Keypress]);
    assert_eq!(steps[1].commands, vec!["await page.keyboard.press(`Escape`);".to_string()]);
}

/// Memory store whose step list can be made unreadable
#[derive(Default)]
struct UnreliableStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
}

impl CaptureStore for UnreliableStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        if key == KEY_STEPS && self.fail_reads.load(Ordering::SeqCst) {
            return Err(RecorderError::Storage("storage backend timed out".to_string()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

#[test]
fn unreadable_store_drops_the_step_and_keeps_history() {
    let store = Arc::new(UnreliableStore::default());
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session(store.clone(), clock.clone());

    let page = Page::parse(LOGIN).with_url("https://app.example.com/login");
    session.start(&page).unwrap();
    session.handle_event(&page, DomEvent::click(page.select_first("button").unwrap()));
    assert_eq!(session.steps().len(), 2);

    clock.advance(5_000);
    store.fail_reads.store(true, Ordering::SeqCst);
    let button = page.select_first("button").unwrap();
    assert!(session.handle_event(&page, DomEvent::click(button)).is_empty());

    store.fail_reads.store(false, Ordering::SeqCst);
    let state = CaptureState::new(store.clone());
    assert_eq!(state.load_steps().unwrap().len(), 2);

    clock.advance(5_000);
    assert_eq!(session.handle_event(&page, DomEvent::click(button)).len(), 1);
    let kinds: Vec<StepKind> = session.steps().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Goto, StepKind::Click, StepKind::Click]);
}

#[test]
fn malformed_steps_on_disk_are_not_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.json");
    let original = r#"{"stepCaptureActive":true,"currentCaptureUrl":"https://app.example.com/login","capturedSteps":"garbage"}"#;
    std::fs::write(&path, original).unwrap();

    let page = Page::parse(LOGIN).with_url("https://app.example.com/login");
    let mut session = session(Arc::new(JsonFileStore::new(&path)), Arc::new(ManualClock::new(0)));
    assert!(session.restore(&page));
    assert!(session.steps().is_empty());

    let button = page.select_first("button").unwrap();
    assert!(session.handle_event(&page, DomEvent::click(button)).is_empty());

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk[KEY_STEPS], Value::String("garbage".to_string()));
}

#[test]
fn truncated_capture_file_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.json");
    let truncated = r#"{"stepCaptureActive":true,"capturedSteps":[{"kind":"goto","comm"#;
    std::fs::write(&path, truncated).unwrap();

    let page = Page::parse(LOGIN).with_url("https://app.example.com/login");
    let mut session = session(Arc::new(JsonFileStore::new(&path)), Arc::new(ManualClock::new(0)));
    assert!(!session.restore(&page));
    assert_eq!(session.status(), CaptureStatus::Idle);
    assert!(session.steps().is_empty());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), truncated);
}
