//! CLI context - resolved configuration and output preferences

use crate::config::{parse_delimiter, HarnessConfig, ValidationMode};
use crate::error::{HarnessError, HarnessResult};
use std::path::PathBuf;

/// Values given on the command line. `None` leaves the config value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<f64>,
    pub delimiter: Option<String>,
    pub max_rows: Option<usize>,
    pub mode: Option<ValidationMode>,
    pub top_mismatches: Option<usize>,
    pub health_url: Option<String>,
    pub delay_ms: Option<u64>,
}

/// Shared context for a harness run
pub struct CliContext {
    /// Config file the settings came from, if any
    pub config_path: Option<PathBuf>,
    pub config: HarnessConfig,
    /// Output format preference
    pub output_format: super::OutputFormat,
    /// Quiet mode (suppress status messages)
    pub quiet: bool,
    /// Verbose mode (extra debug output)
    pub verbose: bool,
}

impl CliContext {
    /// Create a context from an explicit configuration file
    pub fn new(config_path: PathBuf) -> HarnessResult<Self> {
        if !config_path.exists() {
            return Err(HarnessError::Config(format!(
                "config file {:?} does not exist",
                config_path
            )));
        }
        let config = HarnessConfig::load(&config_path)?;
        Ok(Self::from_config(Some(config_path), config))
    }

    /// Create context from the default config locations, or built-in defaults
    pub fn with_defaults() -> HarnessResult<Self> {
        let (config_path, config) = HarnessConfig::discover()?;
        Ok(Self::from_config(config_path, config))
    }

    pub fn from_config(config_path: Option<PathBuf>, config: HarnessConfig) -> Self {
        Self {
            config_path,
            config,
            output_format: super::OutputFormat::Table,
            quiet: false,
            verbose: false,
        }
    }

    /// Apply command-line values on top of the loaded configuration, then
    /// validate the result. Priority: CLI > config file > defaults.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> HarnessResult<()> {
        let config = &mut self.config;
        if let Some(endpoint) = overrides.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(delimiter) = overrides.delimiter {
            parse_delimiter(&delimiter)
                .map_err(|e| HarnessError::InvalidArgument(e.to_string()))?;
            config.delimiter = Some(delimiter);
        }
        if let Some(max_rows) = overrides.max_rows {
            config.max_rows = max_rows;
        }
        if let Some(mode) = overrides.mode {
            config.mode = mode;
        }
        if let Some(top) = overrides.top_mismatches {
            config.top_mismatches = top;
        }
        if overrides.health_url.is_some() {
            config.health_url = overrides.health_url;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            config.delay_ms = delay_ms;
        }
        config.validate()
    }

    /// Print status message (respects quiet mode)
    pub fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}
