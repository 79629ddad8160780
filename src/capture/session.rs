//! Interaction capture state machine
//!
//! A [`CaptureSession`] turns page events into [`CapturedStep`]s while
//! capturing, keeps them in a [`CaptureStore`] for review, and hands the
//! reviewed sequence to a [`TestGenerator`]. The store copy is authoritative:
//! every step write re-reads it first, so edits made by a review surface in
//! the meantime are kept. When that read fails the step is dropped rather
//! than written over what is stored.
//!
//! [`CaptureStore`]: crate::capture::store::CaptureStore

use crate::capture::config::CaptureConfig;
use crate::capture::debounce::{Clock, Debouncer, SystemClock};
use crate::capture::event::{DomEvent, EventKind, FieldState};
use crate::capture::export::{TestGenerator, TestRequest};
use crate::capture::listener::{EventHost, ListenerSet};
use crate::capture::step::{CapturedStep, StepContext, StepKind};
use crate::capture::store::{CaptureState, CaptureStore};
use crate::codegen::{
    Action, ClickOptions, SelectValue, build_action_commands, build_drag_drop_from_locators, build_goto_commands,
    build_key_press_commands,
};
use crate::dom::page::{parent_element, tag_name};
use crate::dom::{ElementInfo, Page, unique_selector};
use crate::error::{RecorderError, Result};
use crate::locator::{generate_locators, scope_to_frames};
use scraper::ElementRef;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Input types that are not filled as text
const NON_TEXT_INPUT_TYPES: [&str; 10] = [
    "checkbox", "radio", "file", "submit", "button", "reset", "image", "hidden", "range", "color",
];

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Capturing,
    Reviewing,
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CaptureStatus::Idle => "idle",
            CaptureStatus::Capturing => "capturing",
            CaptureStatus::Reviewing => "reviewing",
        };
        f.write_str(name)
    }
}

/// Notifications raised by a session
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureNotice {
    StepCaptured { index: usize, step: CapturedStep },
    /// Capture resumed on a new page of the same site
    Restored { steps: Vec<CapturedStep> },
    /// A step was dropped because the sequence is full
    LimitReached { max_steps: usize },
    Stopped { steps: usize },
}

/// Page details taken when the event happened
#[derive(Debug, Clone, Default)]
struct PageSummary {
    url: Option<String>,
    title: Option<String>,
    dom_context: String,
    /// Selectors of the frames enclosing the document, outermost first
    frames: Vec<String>,
}

impl PageSummary {
    fn of(page: &Page, config: &CaptureConfig) -> Self {
        Self {
            url: page.url().map(|url| truncate_url(url, config.max_url_len)),
            title: page.title(),
            dom_context: page.dom_context(config.max_dom_context_len),
            frames: Vec::new(),
        }
    }

    fn in_frames(mut self, frames: &[String]) -> Self {
        self.frames = frames.to_vec();
        self
    }
}

/// A step before it is numbered, timestamped and stored
#[derive(Debug, Clone)]
struct StepDraft {
    kind: StepKind,
    commands: Vec<String>,
    element: Option<ElementInfo>,
    page: PageSummary,
    /// Field key and value of a fill
    fill: Option<(String, String)>,
}

#[derive(Debug, Clone)]
struct Emitted {
    command: String,
    kind: StepKind,
    at: u64,
}

/// Records page interactions as reviewable steps
pub struct CaptureSession {
    config: CaptureConfig,
    state: CaptureState,
    host: Arc<dyn EventHost>,
    clock: Arc<dyn Clock>,
    status: CaptureStatus,
    listeners: ListenerSet,
    pending_fill: Debouncer<StepDraft>,
    drag_source: Option<Vec<String>>,
    last_fill: Option<(String, String)>,
    last_emitted: Option<Emitted>,
    last_url: Option<String>,
    limit_notified: bool,
    /// Clock time step timestamps are measured from
    started_at: u64,
    subscribers: Vec<mpsc::UnboundedSender<CaptureNotice>>,
}

impl CaptureSession {
    pub fn new(config: CaptureConfig, store: Arc<dyn CaptureStore>, host: Arc<dyn EventHost>) -> Self {
        let pending_fill = Debouncer::new(config.debounce_ms);
        Self {
            config,
            state: CaptureState::new(store),
            host,
            clock: Arc::new(SystemClock),
            status: CaptureStatus::Idle,
            listeners: ListenerSet::default(),
            pending_fill,
            drag_source: None,
            last_fill: None,
            last_emitted: None,
            last_url: None,
            limit_notified: false,
            started_at: 0,
            subscribers: Vec::new(),
        }
    }

    /// Builder method: use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    pub fn is_capturing(&self) -> bool {
        self.status == CaptureStatus::Capturing
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Whether a text field value is waiting for its debounce to expire
    pub fn has_pending_fill(&self) -> bool {
        self.pending_fill.is_pending()
    }

    /// Receive notices raised from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CaptureNotice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, notice: CaptureNotice) {
        self.subscribers.retain(|tx| tx.send(notice.clone()).is_ok());
    }

    fn require(&self, operation: &str, allowed: &[CaptureStatus]) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(RecorderError::InvalidState {
                operation: operation.to_string(),
                state: self.status.to_string(),
            })
        }
    }

    fn reset_transient(&mut self) {
        self.pending_fill.cancel();
        self.drag_source = None;
        self.last_fill = None;
        self.last_emitted = None;
        self.last_url = None;
        self.limit_notified = false;
    }

    /// Begin capturing on `page`.
    ///
    /// Clears any previous sequence, attaches listeners and records a
    /// navigation step for the page's URL. Calling it while already
    /// capturing does nothing.
    pub fn start(&mut self, page: &Page) -> Result<()> {
        if self.is_capturing() {
            log::info!("Capture already running, ignoring start");
            return Ok(());
        }
        self.require("start", &[CaptureStatus::Idle])?;

        self.listeners = ListenerSet::attach_all(self.host.clone(), &EventKind::CAPTURED)?;
        self.reset_transient();
        self.started_at = self.clock.now_millis();
        self.state.set_steps(&[]);
        self.state.set_start_time(self.started_at);
        self.state.set_active(true);
        if let Some(url) = page.url() {
            self.state.set_origin_url(url);
        }
        self.status = CaptureStatus::Capturing;
        log::info!("Capture started on {}", page.url().unwrap_or("<unknown page>"));

        if let Some(url) = page.url() {
            let draft = StepDraft {
                kind: StepKind::Goto,
                commands: build_goto_commands(url),
                element: None,
                page: PageSummary::of(page, &self.config),
                fill: None,
            };
            self.commit(draft);
        }
        Ok(())
    }

    /// Stop capturing and keep the steps for review.
    ///
    /// A fill still waiting for its debounce is dropped.
    pub fn stop(&mut self) -> Result<()> {
        self.require("stop", &[CaptureStatus::Capturing])?;

        self.listeners.release();
        if self.pending_fill.is_pending() {
            log::debug!("Dropping pending fill on stop");
        }
        self.pending_fill.cancel();
        self.drag_source = None;
        self.state.set_active(false);
        self.status = CaptureStatus::Reviewing;

        let steps = self.state.steps().len();
        log::info!("Capture stopped with {} steps", steps);
        self.notify(CaptureNotice::Stopped { steps });
        Ok(())
    }

    /// Go back to capturing without losing the steps so far
    pub fn resume(&mut self) -> Result<()> {
        if self.is_capturing() {
            return Ok(());
        }
        self.require("resume", &[CaptureStatus::Reviewing])?;

        self.listeners = ListenerSet::attach_all(self.host.clone(), &EventKind::CAPTURED)?;
        self.state.set_active(true);
        self.status = CaptureStatus::Capturing;
        log::info!("Capture resumed");
        Ok(())
    }

    /// Throw away the steps and every persisted key
    pub fn discard(&mut self) -> Result<()> {
        self.listeners.release();
        self.reset_transient();
        self.state.clear();
        self.status = CaptureStatus::Idle;
        log::info!("Capture discarded");
        Ok(())
    }

    /// Pick capture back up after a full page load.
    ///
    /// When the persisted flag is set and `page` is on the same host as the
    /// page capture started on, listeners are reattached and `true` is
    /// returned. A different host clears all state.
    pub fn restore(&mut self, page: &Page) -> bool {
        if !self.state.is_active() {
            return false;
        }

        let same_site = match (self.state.origin_url(), page.url()) {
            (Some(origin), Some(current)) => same_host(&origin, current),
            _ => false,
        };
        if !same_site {
            log::info!("Page left the captured site, clearing capture state");
            self.listeners.release();
            self.reset_transient();
            self.state.clear();
            self.status = CaptureStatus::Idle;
            return false;
        }

        self.listeners.release();
        match ListenerSet::attach_all(self.host.clone(), &EventKind::CAPTURED) {
            Ok(listeners) => self.listeners = listeners,
            Err(e) => {
                log::warn!("Failed to reattach listeners: {}", e);
                return false;
            }
        }
        self.pending_fill.cancel();
        self.drag_source = None;
        self.started_at = match self.state.start_time() {
            Some(start) => start,
            None => self.clock.now_millis(),
        };
        self.status = CaptureStatus::Capturing;

        let steps = self.state.steps();
        log::info!("Capture restored with {} steps", steps.len());
        self.notify(CaptureNotice::Restored { steps });
        true
    }

    /// Classify one page event. Returns the steps it caused to be stored.
    pub fn handle_event(&mut self, page: &Page, event: DomEvent<'_>) -> Vec<CapturedStep> {
        self.handle_frame_event(page, &[], event)
    }

    /// Classify an event raised inside nested frames.
    ///
    /// `page` is the frame's own document and `frames` selects the enclosing
    /// frame elements, outermost first. Locators of the resulting steps are
    /// scoped with `frameLocator` accordingly.
    pub fn handle_frame_event(&mut self, page: &Page, frames: &[String], event: DomEvent<'_>) -> Vec<CapturedStep> {
        if !self.is_capturing() {
            return Vec::new();
        }
        if event.target().is_some_and(|target| self.is_recorder_ui(target)) {
            log::debug!("Ignoring {} on recorder UI", event.name());
            return Vec::new();
        }

        let summary = PageSummary::of(page, &self.config).in_frames(frames);
        match event {
            DomEvent::Click {
                target,
                detail,
                button,
                modifiers,
            } => {
                if is_changed_not_clicked(target) {
                    log::debug!("Leaving {} click to its change event", tag_name(target));
                    return Vec::new();
                }
                let options = modifiers
                    .into_iter()
                    .fold(ClickOptions::new().button(button), ClickOptions::modifier);
                let (action, kind) = if detail >= 2 {
                    (Action::DoubleClick(options), StepKind::Dblclick)
                } else {
                    (Action::Click(options), StepKind::Click)
                };
                self.commit_action(page, target, action, kind, summary)
            }
            DomEvent::Input { target, state } => {
                if is_text_field(target) {
                    self.arm_fill(page, target, state.value, summary)
                } else {
                    Vec::new()
                }
            }
            DomEvent::Change { target, state } => self.handle_change(page, target, state, summary),
            DomEvent::KeyDown { target, key } => {
                if !self.config.is_meaningful_key(&key) {
                    return Vec::new();
                }
                let (commands, element) = match target.filter(|t| !matches!(tag_name(*t).as_str(), "body" | "html")) {
                    Some(target) => (
                        build_key_press_commands(&frame_locators(page, target, frames), &key),
                        Some(page.element_info(target)),
                    ),
                    None => (build_key_press_commands(&[], &key), None),
                };
                self.commit(StepDraft {
                    kind: StepKind::Keypress,
                    commands,
                    element,
                    page: summary,
                    fill: None,
                })
            }
            DomEvent::DragStart { target } => {
                self.drag_source = Some(frame_locators(page, target, frames));
                Vec::new()
            }
            DomEvent::Drop { target } => {
                let Some(sources) = self.drag_source.take() else {
                    log::debug!("Drop without a drag source");
                    return Vec::new();
                };
                let targets = frame_locators(page, target, frames);
                self.commit(StepDraft {
                    kind: StepKind::Dragdrop,
                    commands: build_drag_drop_from_locators(&sources, &targets),
                    element: Some(page.element_info(target)),
                    page: summary,
                    fill: None,
                })
            }
            DomEvent::Hover { .. } => {
                log::debug!("Hover is never captured");
                Vec::new()
            }
        }
    }

    fn handle_change(
        &mut self,
        page: &Page,
        target: ElementRef<'_>,
        state: FieldState,
        summary: PageSummary,
    ) -> Vec<CapturedStep> {
        let tag = tag_name(target);
        let input_type = input_type(target);

        match (tag.as_str(), input_type.as_str()) {
            ("input", "checkbox") => {
                let action = if state.checked { Action::Check } else { Action::Uncheck };
                self.commit_action(page, target, action, StepKind::Check, summary)
            }
            ("input", "radio") => self.commit_action(page, target, Action::Check, StepKind::Check, summary),
            ("input", "file") => {
                self.commit_action(page, target, Action::SetInputFiles(state.files), StepKind::Input, summary)
            }
            ("select", _) => {
                let value = if target.value().attr("multiple").is_some() {
                    SelectValue::Multiple(state.selected)
                } else {
                    SelectValue::Single(state.selected.into_iter().next().unwrap_or(state.value))
                };
                self.commit_action(page, target, Action::SelectOption(value), StepKind::Select, summary)
            }
            _ if is_text_field(target) => {
                let key = field_key(page, target, &summary.frames);
                if self.pending_fill.pending_key() == Some(key.as_str()) {
                    // Blur after typing: commit now with the final value
                    let mut steps = self.arm_fill(page, target, state.value, summary);
                    if let Some(draft) = self.pending_fill.flush() {
                        steps.extend(self.emit(draft));
                    }
                    return steps;
                }
                if self.last_fill.as_ref().is_some_and(|(k, v)| *k == key && *v == state.value) {
                    log::debug!("Ignoring change repeating the last fill");
                    return Vec::new();
                }
                let locators = frame_locators(page, target, &summary.frames);
                let draft = StepDraft {
                    kind: StepKind::Input,
                    commands: build_action_commands(&locators, &Action::Fill(state.value.clone())),
                    element: Some(page.element_info(target)),
                    page: summary,
                    fill: Some((key, state.value)),
                };
                self.commit(draft)
            }
            _ => Vec::new(),
        }
    }

    fn commit_action(
        &mut self,
        page: &Page,
        target: ElementRef<'_>,
        action: Action,
        kind: StepKind,
        summary: PageSummary,
    ) -> Vec<CapturedStep> {
        let locators = frame_locators(page, target, &summary.frames);
        self.commit(StepDraft {
            kind,
            commands: build_action_commands(&locators, &action),
            element: Some(page.element_info(target)),
            page: summary,
            fill: None,
        })
    }

    /// Hold a text value until the field has been idle for the debounce delay
    fn arm_fill(&mut self, page: &Page, target: ElementRef<'_>, value: String, summary: PageSummary) -> Vec<CapturedStep> {
        let key = field_key(page, target, &summary.frames);
        let locators = frame_locators(page, target, &summary.frames);
        let draft = StepDraft {
            kind: StepKind::Input,
            commands: build_action_commands(&locators, &Action::Fill(value.clone())),
            element: Some(page.element_info(target)),
            page: summary,
            fill: Some((key.clone(), value)),
        };

        let now = self.clock.now_millis();
        match self.pending_fill.arm(key, draft, now) {
            Some(displaced) => self.emit(displaced),
            None => Vec::new(),
        }
    }

    /// Commit the pending fill if its field has been idle long enough
    pub fn tick(&mut self) -> Option<CapturedStep> {
        if !self.is_capturing() {
            return None;
        }
        let draft = self.pending_fill.tick(self.clock.now_millis())?;
        self.emit(draft).into_iter().next()
    }

    /// Commit the pending fill now, if any
    pub fn flush_pending(&mut self) -> Option<CapturedStep> {
        let draft = self.pending_fill.flush()?;
        self.emit(draft).into_iter().next()
    }

    /// Emit `draft` after any pending fill, keeping event order
    fn commit(&mut self, draft: StepDraft) -> Vec<CapturedStep> {
        let mut steps = Vec::new();
        if let Some(pending) = self.pending_fill.flush() {
            steps.extend(self.emit(pending));
        }
        steps.extend(self.emit(draft));
        steps
    }

    fn emit(&mut self, draft: StepDraft) -> Vec<CapturedStep> {
        let Some(first) = draft.commands.first().cloned() else {
            log::debug!("No locator for {} step, skipping", draft.kind);
            return Vec::new();
        };

        let now = self.clock.now_millis();
        let window = self.config.duplicate_window_ms;
        let duplicate = self.last_emitted.as_ref().is_some_and(|last| {
            last.command == first && last.kind == draft.kind && now.saturating_sub(last.at) < window
        });
        if duplicate {
            log::debug!("Dropping duplicate {} step", draft.kind);
            return Vec::new();
        }

        let max_steps = self.config.max_steps;
        let max_contexts = self.config.max_contexts;
        let url_changed = draft.page.url.is_some() && draft.page.url != self.last_url;
        let kind = draft.kind;
        let elapsed = now.saturating_sub(self.started_at);

        let stored = self.state.update_steps(|steps| {
            if steps.len() >= max_steps {
                return None;
            }

            let mut context = StepContext {
                element: draft.element,
                ..Default::default()
            };
            if steps.is_empty() || kind == StepKind::Goto || url_changed {
                context.dom_context = Some(draft.page.dom_context);
                context.page_url = draft.page.url.clone();
                context.page_title = draft.page.title;
            }

            let mut step = CapturedStep::new(kind, draft.commands, elapsed);
            if context != StepContext::default() {
                step = step.with_context(context);
            }
            steps.push(step.clone());
            drop_old_contexts(steps, max_contexts);
            Some((steps.len() - 1, step))
        });
        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("Dropping {} step, captured steps could not be read: {}", kind, e);
                return Vec::new();
            }
        };

        let Some((index, step)) = stored else {
            log::warn!("Step limit of {} reached, dropping {} step", max_steps, kind);
            if !self.limit_notified {
                self.limit_notified = true;
                self.notify(CaptureNotice::LimitReached { max_steps });
            }
            return Vec::new();
        };

        if draft.page.url.is_some() {
            self.last_url = draft.page.url;
        }
        if draft.fill.is_some() {
            self.last_fill = draft.fill;
        }
        self.last_emitted = Some(Emitted {
            command: first,
            kind,
            at: now,
        });

        log::debug!("Captured {} step #{}: {}", kind, index, step.commands[0]);
        self.notify(CaptureNotice::StepCaptured {
            index,
            step: step.clone(),
        });
        vec![step]
    }

    fn is_recorder_ui(&self, element: ElementRef<'_>) -> bool {
        std::iter::successors(Some(element), |el| parent_element(*el)).any(|el| {
            el.value()
                .id()
                .is_some_and(|id| self.config.ui_container_ids.iter().any(|ui| ui == id))
        })
    }

    /// The current step sequence, read from the store
    pub fn steps(&self) -> Vec<CapturedStep> {
        self.state.steps()
    }

    /// Remove one step
    pub fn delete_step(&mut self, index: usize) -> Result<CapturedStep> {
        self.state.update_steps(|steps| {
            if index < steps.len() {
                Ok(steps.remove(index))
            } else {
                Err(RecorderError::StepNotFound(index))
            }
        })?
    }

    /// Replace the text of one alternative command of a step
    pub fn edit_command(&mut self, index: usize, command: usize, text: &str) -> Result<()> {
        self.state.update_steps(|steps| {
            let step = steps.get_mut(index).ok_or(RecorderError::StepNotFound(index))?;
            if step.edit_command(command, text) {
                Ok(())
            } else {
                Err(RecorderError::CommandNotFound { step: index, command })
            }
        })?
    }

    /// Choose which alternative command a step exports
    pub fn select_command(&mut self, index: usize, command: usize) -> Result<()> {
        self.state.update_steps(|steps| {
            steps
                .get_mut(index)
                .ok_or(RecorderError::StepNotFound(index))
                .map(|step| step.select_command(command))
        })?
    }

    /// Hand the reviewed steps to `generator`.
    ///
    /// On success the sequence is cleared and the session returns to idle.
    /// On failure nothing changes and the error is meant for the user.
    pub fn create_test(&mut self, name: &str, generator: &dyn TestGenerator) -> Result<String> {
        self.require("create_test", &[CaptureStatus::Reviewing])?;

        let request = TestRequest::new(name, &self.state.steps());
        if request.steps.is_empty() {
            return Err(RecorderError::TestCreationFailed("there are no steps to export".to_string()));
        }

        let location = generator.generate(&request).map_err(|e| {
            log::warn!("Test creation for '{}' failed: {}", name, e);
            RecorderError::TestCreationFailed(e.to_string())
        })?;

        log::info!("Created test '{}' at {}", name, location);
        self.discard()?;
        Ok(location)
    }
}

/// Keep the page summary only on the latest `max` steps that have one
fn drop_old_contexts(steps: &mut [CapturedStep], max: usize) {
    let with_context: Vec<usize> = steps
        .iter()
        .enumerate()
        .filter(|(_, step)| step.has_dom_context())
        .map(|(i, _)| i)
        .collect();
    let excess = with_context.len().saturating_sub(max);
    for &i in &with_context[..excess] {
        if let Some(context) = steps[i].context.as_mut() {
            context.dom_context = None;
        }
    }
}

fn input_type(element: ElementRef<'_>) -> String {
    element.value().attr("type").unwrap_or("text").to_ascii_lowercase()
}

fn is_text_field(element: ElementRef<'_>) -> bool {
    match tag_name(element).as_str() {
        "textarea" => true,
        "input" => !NON_TEXT_INPUT_TYPES.contains(&input_type(element).as_str()),
        _ => false,
    }
}

/// Targets whose click is recorded by the change event that follows
fn is_changed_not_clicked(element: ElementRef<'_>) -> bool {
    match tag_name(element).as_str() {
        "select" | "option" => true,
        "input" => matches!(input_type(element).as_str(), "checkbox" | "radio"),
        _ => false,
    }
}

/// Stable key of a form field within a page and its enclosing frames
fn field_key(page: &Page, element: ElementRef<'_>, frames: &[String]) -> String {
    let key = unique_selector(page, element).unwrap_or_else(|| {
        page.path_of(element)
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join("/")
    });
    if frames.is_empty() {
        key
    } else {
        format!("{} >> {}", frames.join(" >> "), key)
    }
}

/// Locators for `element`, scoped to the frames enclosing its document
fn frame_locators(page: &Page, element: ElementRef<'_>, frames: &[String]) -> Vec<String> {
    generate_locators(page, element, false, None)
        .iter()
        .map(|locator| scope_to_frames(locator, frames))
        .collect()
}

fn same_host(a: &str, b: &str) -> bool {
    match (url::Url::parse(a), url::Url::parse(b)) {
        (Ok(a), Ok(b)) => a.host_str().is_some() && a.host_str() == b.host_str(),
        _ => false,
    }
}

/// Shorten a URL to `max` characters, keeping its scheme and host
pub fn truncate_url(url: &str, max: usize) -> String {
    if url.chars().count() <= max {
        return url.to_string();
    }
    let base = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| format!("{}://{}", parsed.scheme(), host)))
        .filter(|base| url.starts_with(base.as_str()));

    match base {
        Some(base) => {
            let remaining = max.saturating_sub(base.len() + 3);
            if remaining == 0 {
                return base;
            }
            let rest: String = url[base.len()..].chars().take(remaining).collect();
            format!("{}{}...", base, rest)
        }
        None => {
            let kept: String = url.chars().take(max.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }
}
