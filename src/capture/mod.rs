//! Recording user interactions as reviewable steps
//!
//! Events enter through [`CaptureSession::handle_event`], text input is
//! debounced into single fills, and every committed step is written to a
//! [`CaptureStore`] so other surfaces can review and edit it.

pub mod config;
pub mod debounce;
pub mod event;
pub mod export;
pub mod listener;
pub mod session;
pub mod step;
pub mod store;

pub use config::CaptureConfig;
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
pub use event::{DomEvent, EventKind, FieldState};
pub use export::{ExportedStep, JsonExporter, PlaywrightFileWriter, TestGenerator, TestRequest};
pub use listener::{EventHost, InMemoryHost, ListenerHandle, ListenerSet};
pub use session::{CaptureNotice, CaptureSession, CaptureStatus};
pub use step::{CapturedStep, StepContext, StepKind};
pub use store::{CaptureState, CaptureStore, JsonFileStore, MemoryStore};
