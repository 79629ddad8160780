use thiserror::Error;

/// Errors raised by the recorder and its browser host
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid value for action '{action}': {reason}")]
    InvalidActionValue { action: String, reason: String },

    #[error("No captured step at index {0}")]
    StepNotFound(usize),

    #[error("Step {step} has no command at index {command}")]
    CommandNotFound { step: usize, command: usize },

    #[error("Cannot {operation} while capture is {state}")]
    InvalidState { operation: String, state: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Test creation failed: {0}")]
    TestCreationFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RecorderError>;
