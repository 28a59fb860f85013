//! Error types and reporting for pipeline stages.

use std::fmt;

/// Errors that can occur while a stage is running.
#[derive(Debug, Clone)]
pub enum StageError {
    /// One iteration failed; the item is dropped and the stage continues.
    Recoverable(String),
    /// The stage cannot continue and shuts down.
    Fatal(String),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StageError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}

/// Trait for reporting stage errors and anomalies.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a stage.
    fn report(&self, stage: &str, error: &StageError);

    /// Reports a non-error anomaly (e.g. a dead stage noticed by the
    /// supervisor's health poll).
    fn anomaly(&self, stage: &str, message: &str) {
        eprintln!("[{}] anomaly: {}", stage, message);
    }
}

/// Simple error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &StageError) {
        eprintln!("[{}] {}", stage, error);
    }
}

/// Reporter that stays silent about recoverable errors. Fatal errors and
/// anomalies are still logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuietReporter;

impl ErrorReporter for QuietReporter {
    fn report(&self, stage: &str, error: &StageError) {
        if let StageError::Fatal(_) = error {
            eprintln!("[{}] {}", stage, error);
        }
    }
}
