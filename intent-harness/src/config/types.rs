use crate::error::{HarnessError, HarnessResult};
use crate::loader::{ColumnAliases, LoaderOptions};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/find-service";
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
pub const DEFAULT_TOP_MISMATCHES: usize = 30;

/// How a response is judged against the expected record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Best-effort extraction across several response shapes
    #[default]
    Loose,
    /// Exact `{"success": true, "data": {...}}` envelope required
    Strict,
}

impl ValidationMode {
    /// Delimiter used by each dialect's CSV files when none is configured.
    pub fn default_delimiter(&self) -> u8 {
        match self {
            ValidationMode::Loose => b';',
            ValidationMode::Strict => b',',
        }
    }
}

impl std::str::FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loose" => Ok(ValidationMode::Loose),
            "strict" => Ok(ValidationMode::Strict),
            _ => Err(format!(
                "Unknown validation mode '{}'. Valid options: loose, strict",
                s
            )),
        }
    }
}

impl Display for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationMode::Loose => write!(f, "loose"),
            ValidationMode::Strict => write!(f, "strict"),
        }
    }
}

/// Extra header spellings, tried before the built-in aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliasOverrides {
    pub intent: Vec<String>,
    pub service_id: Vec<String>,
    pub service_name: Vec<String>,
}

/// Harness configuration as read from `intent_harness.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub endpoint: String,
    pub timeout_secs: f64,
    /// Single-character field delimiter; `None` picks the mode's default
    pub delimiter: Option<String>,
    /// Stop after this many valid rows (0 = unlimited)
    pub max_rows: usize,
    pub mode: ValidationMode,
    /// How many mismatching (expected, predicted) pairs to print
    pub top_mismatches: usize,
    /// Optional GET probe before the first request
    pub health_url: Option<String>,
    /// Pause between consecutive requests
    pub delay_ms: u64,
    pub columns: ColumnAliasOverrides,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delimiter: None,
            max_rows: 0,
            mode: ValidationMode::Loose,
            top_mismatches: DEFAULT_TOP_MISMATCHES,
            health_url: None,
            delay_ms: 0,
            columns: ColumnAliasOverrides::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file. A missing file is an error here;
    /// use [`HarnessConfig::discover`] for the optional lookup.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            HarnessError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Look for a config file in the usual places, falling back to defaults.
    pub fn discover() -> HarnessResult<(Option<PathBuf>, Self)> {
        let default_paths = [
            PathBuf::from("intent_harness.toml"),
            PathBuf::from("config/intent_harness.toml"),
        ];

        for path in &default_paths {
            if path.exists() {
                let config = Self::load(path)?;
                return Ok((Some(path.clone()), config));
            }
        }

        Ok((None, Self::default()))
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(HarnessError::Config("endpoint must not be empty".to_string()));
        }
        self.timeout()?;
        self.delimiter_byte()?;
        Ok(())
    }

    /// Resolve the configured delimiter to the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> HarnessResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(self.mode.default_delimiter()),
            Some(raw) => parse_delimiter(raw),
        }
    }

    /// Request timeout; must be positive and fit in a `Duration`.
    pub fn timeout(&self) -> HarnessResult<Duration> {
        let invalid = || {
            HarnessError::Config(format!(
                "timeout_secs must be a positive number of seconds, got {}",
                self.timeout_secs
            ))
        };
        let timeout = Duration::try_from_secs_f64(self.timeout_secs).map_err(|_| invalid())?;
        if timeout.is_zero() {
            return Err(invalid());
        }
        Ok(timeout)
    }

    pub fn column_aliases(&self) -> ColumnAliases {
        ColumnAliases::default().with_extra(
            &self.columns.intent,
            &self.columns.service_id,
            &self.columns.service_name,
        )
    }

    pub fn loader_options(&self) -> HarnessResult<LoaderOptions> {
        Ok(LoaderOptions {
            delimiter: self.delimiter_byte()?,
            aliases: self.column_aliases(),
            require_service_name: self.mode == ValidationMode::Strict,
            max_rows: self.max_rows,
        })
    }
}

/// Accepts a single ASCII character, or `\t` / `tab` for tab-separated files.
pub fn parse_delimiter(raw: &str) -> HarnessResult<u8> {
    match raw {
        "\\t" | "tab" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(HarnessError::Config(format!(
            "delimiter must be a single ASCII character, got {:?}",
            raw
        ))),
    }
}
