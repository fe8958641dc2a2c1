// intent-harness library
// Replays expected-outcome CSV rows against a find-service classification endpoint.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod loader;
pub mod runner;
pub mod strategy;
pub mod summary;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{HarnessConfig, ValidationMode};
pub use dispatch::{DispatchOutcome, HttpDispatcher, IntentEndpoint};
pub use error::{HarnessError, HarnessResult};
pub use loader::{load_records, LoadedRecords, LoaderOptions, TestRecord};
pub use runner::{HarnessRunner, RunReport};
pub use strategy::{strategy_for, Prediction, RowOutcome, RowStrategy};
pub use summary::RunSummary;
