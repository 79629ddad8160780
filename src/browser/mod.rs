//! Headless Chrome host for live recording

pub mod config;
pub mod recorder;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use recorder::{PageRecorder, RawEvent};
pub use session::{BrowserSession, evaluate_json, snapshot_tab};
