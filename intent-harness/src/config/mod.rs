//! Configuration module for the harness
//!
//! Settings come from three layers: built-in defaults, an optional TOML file,
//! and command-line flags. Later layers win.

pub mod types;

pub use types::*;
