//! Error types for the harness.
//!
//! Only pre-flight problems surface as `HarnessError`: anything that goes wrong
//! while a single row is being classified is recorded on that row's outcome and
//! never aborts the run.

use thiserror::Error;

/// Exit code for a run where every admitted row passed (or loose mode finished).
pub const EXIT_OK: i32 = 0;
/// Exit code when strict mode saw at least one failing row.
pub const EXIT_VALIDATION_FAILED: i32 = 1;
/// Exit code for structural errors (input file, header, columns, configuration).
pub const EXIT_STRUCTURAL: i32 = 2;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("CSV has no header row: {0}")]
    MissingHeader(String),
    #[error("required column for '{field}' not found; tried one of: {}", .tried.join(", "))]
    MissingColumn { field: String, tried: Vec<String> },
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),
}

impl HarnessError {
    /// Process exit code for this error. Every pre-flight error is structural.
    pub fn exit_code(&self) -> i32 {
        EXIT_STRUCTURAL
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(e: std::io::Error) -> Self {
        HarnessError::Io(e.to_string())
    }
}

impl From<csv::Error> for HarnessError {
    fn from(e: csv::Error) -> Self {
        HarnessError::Csv(e.to_string())
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(e: toml::de::Error) -> Self {
        HarnessError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for HarnessError {
    fn from(e: reqwest::Error) -> Self {
        HarnessError::Client(e.to_string())
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
