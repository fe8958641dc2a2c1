//! Output formatting for the harness report

use crate::strategy::RowOutcome;
use crate::summary::RunSummary;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

const INTENT_PREVIEW_CHARS: usize = 40;

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// One JSON object per row, then a summary object
    Json,
    /// Plain text (minimal formatting)
    Plain,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "plain" => Ok(OutputFormat::Plain),
            _ => Err(format!(
                "Unknown output format '{}'. Valid options: table, json, plain",
                s
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Plain => write!(f, "plain"),
        }
    }
}

/// One-line preview of an intent: newlines flattened, long text elided.
pub fn intent_preview(intent: &str) -> String {
    let flat = intent.replace(['\n', '\r'], " ");
    if flat.chars().count() > INTENT_PREVIEW_CHARS {
        let head: String = flat.chars().take(INTENT_PREVIEW_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

pub const NO_VALID_ROWS: &str = "No valid rows in the CSV.";

pub const LOOSE_HEADER: &str = "line  | expected | predicted | ms   | intent (summary)";

/// `line | expected | predicted | ms | intent-or-error`
pub fn format_loose_row(row: &RowOutcome) -> String {
    let tail = match &row.result.raw_error_text {
        Some(error) => format!("ERROR: {}", error),
        None => intent_preview(&row.intent),
    };
    format!(
        "{:5} | {:8} | {:9} | {:4.0} | {}",
        row.line_number,
        row.expected_service_id,
        row.predicted(),
        row.result.latency_ms,
        tail
    )
}

/// `[line] intent='..' → OK (...)` or the failure reason.
pub fn format_strict_row(row: &RowOutcome) -> String {
    let name = row.service_name.as_deref().unwrap_or("");
    if row.passed {
        return format!(
            "[{:04}] intent='{}' → OK (service_id={}, service_name='{}')",
            row.line_number, row.intent, row.expected_service_id, name
        );
    }
    let reason = row.reason.as_deref().unwrap_or("failed");
    match &row.payload {
        Some(payload) => format!(
            "[{:04}] intent='{}' → {} | payload={}",
            row.line_number, row.intent, reason, payload
        ),
        None => format!("[{:04}] intent='{}' → {}", row.line_number, row.intent, reason),
    }
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    #[serde(flatten)]
    summary: &'a RunSummary,
    failed: usize,
    accuracy: Option<f64>,
    top_mismatches: Vec<crate::summary::PairCount>,
}

/// Output formatter for consistent CLI output
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            _ => {
                eprintln!("{} {}", "✗".red(), message);
            }
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            _ => {
                eprintln!("{} {}", "⚠".yellow(), message);
            }
        }
    }

    /// Print data as JSON on a single line
    pub fn json<T: Serialize>(&self, data: &T) {
        match serde_json::to_string(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to serialize to JSON: {}", e)),
        }
    }

    /// Print a section title
    pub fn section(&self, title: &str) {
        match self.format {
            OutputFormat::Table => {
                println!();
                println!("{}", title.bold().underline());
            }
            OutputFormat::Plain => {
                println!();
                println!("{}", title);
                println!("{}", "-".repeat(title.chars().count()));
            }
            OutputFormat::Json => {}
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        match self.format {
            OutputFormat::Table => {
                println!("  {} {}", "•".cyan(), item);
            }
            OutputFormat::Plain => {
                println!("  - {}", item);
            }
            OutputFormat::Json => {}
        }
    }

    /// Column header printed before the first row
    pub fn rows_header(&self, strict: bool) {
        match self.format {
            OutputFormat::Json => {}
            _ if strict => println!("{}", "-".repeat(80)),
            OutputFormat::Table => {
                println!("{}", LOOSE_HEADER.bold());
                println!("{}", "-".repeat(90));
            }
            OutputFormat::Plain => {
                println!("{}", LOOSE_HEADER);
                println!("{}", "-".repeat(90));
            }
        }
    }

    /// Exactly one line per admitted row
    pub fn row(&self, row: &RowOutcome, strict: bool) {
        if self.format == OutputFormat::Json {
            self.json(row);
            return;
        }
        let line = if strict {
            format_strict_row(row)
        } else {
            format_loose_row(row)
        };
        match (self.format, strict) {
            (OutputFormat::Table, true) if row.passed => println!("{} {}", "✓".green(), line),
            (OutputFormat::Table, true) => println!("{} {}", "✗".red(), line),
            (OutputFormat::Table, false) if !row.passed => println!("{}", line.yellow()),
            _ => println!("{}", line),
        }
    }

    /// Reported instead of a summary when nothing was admitted
    pub fn no_valid_rows(&self, skipped_empty_intent: usize) {
        match self.format {
            OutputFormat::Json => self.json(&serde_json::json!({
                "status": "no_valid_rows",
                "skipped_empty_intent": skipped_empty_intent,
            })),
            _ => println!("{}", NO_VALID_ROWS),
        }
    }

    pub fn summary(&self, summary: &RunSummary, top: usize) {
        if self.format == OutputFormat::Json {
            self.json(&JsonSummary {
                summary,
                failed: summary.failed(),
                accuracy: summary.accuracy(),
                top_mismatches: summary.top_mismatches(top),
            });
            return;
        }

        self.section("Summary");
        let accuracy = summary
            .accuracy()
            .map(|a| format!("{:.2}%", a))
            .unwrap_or_else(|| "n/a".to_string());

        match summary.mode {
            crate::config::ValidationMode::Loose => {
                println!(
                    "Total: {}  |  Correct: {}  |  Accuracy: {}",
                    summary.total, summary.correct, accuracy
                );
                let mismatches = summary.top_mismatches(top);
                if !mismatches.is_empty() {
                    self.section("Errors (expected -> predicted : count)");
                    for pair in mismatches {
                        println!("{:>3} -> {:>3} : {}", pair.expected, pair.predicted, pair.count);
                    }
                }
            }
            crate::config::ValidationMode::Strict => {
                println!(
                    "Total: {} | Passed: {} | Failed: {} | Skipped (empty intent): {}",
                    summary.total,
                    summary.correct,
                    summary.failed(),
                    summary.skipped_empty_intent
                );
                if !summary.failures_by_kind.is_empty() {
                    self.section("Failures by kind");
                    for (kind, count) in &summary.failures_by_kind {
                        self.list_item(&format!("{}: {}", kind.label(), count));
                    }
                }
                if !summary.failures_by_service.is_empty() {
                    self.section("Failures by service");
                    for (service, count) in &summary.failures_by_service {
                        self.list_item(&format!("{}: {}", service, count));
                    }
                }
            }
        }
    }
}
