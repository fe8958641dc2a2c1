//! Harness CLI module
//!
//! Shared pieces behind the `intent-harness` binary: configuration layering
//! and report rendering.

pub mod context;
pub mod output;

pub use context::{CliContext, ConfigOverrides};
pub use output::{OutputFormat, OutputFormatter};
