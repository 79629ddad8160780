//! # step-recorder
//!
//! Records user interactions on web pages and turns them into Playwright test
//! steps, each with several ranked, human-readable locator alternatives.
//!
//! ## Features
//!
//! - **Locator generation**: test ids, ARIA role + accessible name, visible
//!   text, meaningful ids and classes, structural CSS paths, with ambiguity
//!   resolved by index, `first()` or parent chains
//! - **Statement building**: actions, assertions, key presses, navigation and
//!   drag and drop rendered as Playwright statements
//! - **Interaction capture**: a session state machine with debounced text
//!   input, durable step storage and same-site restoration across page loads
//! - **Live recording**: a headless Chrome bridge feeding real page events
//!   into a capture session
//!
//! ## Generating locators
//!
//! ```rust
//! use step_recorder::dom::Page;
//! use step_recorder::locator::generate_locators;
//!
//! let page = Page::parse(r#"<button data-testid="submit-btn">Submit</button>"#);
//! let button = page.select_first("button").unwrap();
//!
//! let locators = generate_locators(&page, button, false, None);
//! assert_eq!(locators[0], "page.getByTestId(`submit-btn`)");
//! ```
//!
//! ## Capturing steps
//!
//! ```rust
//! use std::sync::Arc;
//! use step_recorder::capture::{CaptureConfig, CaptureSession, DomEvent, InMemoryHost, MemoryStore};
//! use step_recorder::dom::Page;
//!
//! # fn main() -> step_recorder::Result<()> {
//! let page = Page::parse(r#"<button data-testid="save">Save</button>"#).with_url("https://app.example.com/");
//! let mut session = CaptureSession::new(
//!     CaptureConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(InMemoryHost::new()),
//! );
//!
//! session.start(&page)?;
//! let button = page.select_first("button").unwrap();
//! session.handle_event(&page, DomEvent::click(button));
//! session.stop()?;
//!
//! assert_eq!(session.steps().len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: parsed pages, element snapshots and structural query utilities
//! - [`locator`]: the locator strategy engine
//! - [`codegen`]: action and assertion statement builders
//! - [`capture`]: the interaction capture state machine, storage and export
//! - [`browser`]: Chrome session management and the live event bridge
//! - [`prompt`]: task prompts for coding assistants
//! - [`error`]: error types and result aliases

pub mod browser;
pub mod capture;
pub mod codegen;
pub mod dom;
pub mod error;
pub mod locator;
pub mod prompt;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, PageRecorder};
pub use capture::{CaptureConfig, CaptureSession, CaptureStatus, CapturedStep, StepKind};
pub use codegen::{Action, ActionKind, Assertion, AssertionKind};
pub use dom::{ElementSnapshot, Page};
pub use error::{RecorderError, Result};
pub use locator::{generate_locators, generate_snapshot_locators};
