//! Record loader
//!
//! Reads the expected-outcome CSV into memory. Two header dialects exist in the
//! wild (`service_id;service_name;intent` and the aliased `id,intencao,...`
//! form), so columns are resolved through an alias table once, before any row
//! is looked at.

use crate::error::{HarnessError, HarnessResult};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// One admitted row of the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    /// 1-based line in the source file (the header is line 1)
    pub line_number: usize,
    pub expected_service_id: i64,
    pub service_name: Option<String>,
    pub intent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    Intent,
    ServiceId,
    ServiceName,
}

impl LogicalField {
    pub fn name(&self) -> &'static str {
        match self {
            LogicalField::Intent => "intent",
            LogicalField::ServiceId => "service_id",
            LogicalField::ServiceName => "service_name",
        }
    }
}

/// Accepted header spellings per logical field, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    pub intent: Vec<String>,
    pub service_id: Vec<String>,
    pub service_name: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|n| n.to_string()).collect()
        }
        Self {
            intent: owned(&["intent", "intencao", "intenção"]),
            service_id: owned(&["service_id", "id"]),
            service_name: owned(&["service_name", "service", "nome_servico", "nome_serviço"]),
        }
    }
}

impl ColumnAliases {
    /// Prepend extra spellings so they win over the built-in ones.
    pub fn with_extra(
        mut self,
        intent: &[String],
        service_id: &[String],
        service_name: &[String],
    ) -> Self {
        fn merge(extra: &[String], base: Vec<String>) -> Vec<String> {
            let mut merged: Vec<String> = extra.iter().map(|a| normalize_header(a)).collect();
            for alias in base {
                if !merged.contains(&alias) {
                    merged.push(alias);
                }
            }
            merged
        }
        self.intent = merge(intent, self.intent);
        self.service_id = merge(service_id, self.service_id);
        self.service_name = merge(service_name, self.service_name);
        self
    }

    pub fn for_field(&self, field: LogicalField) -> &[String] {
        match field {
            LogicalField::Intent => &self.intent,
            LogicalField::ServiceId => &self.service_id,
            LogicalField::ServiceName => &self.service_name,
        }
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub intent: usize,
    pub service_id: usize,
    pub service_name: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub delimiter: u8,
    pub aliases: ColumnAliases,
    pub require_service_name: bool,
    /// 0 = unlimited
    pub max_rows: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            aliases: ColumnAliases::default(),
            require_service_name: false,
            max_rows: 0,
        }
    }
}

/// Everything the loader learned about the file.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<TestRecord>,
    /// Rows dropped because the id was not an integer
    pub skipped_invalid_id: usize,
    /// Line numbers of rows dropped because the intent was empty
    pub skipped_empty_intent: Vec<usize>,
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Canonical comparable form of an identifier: trimmed, with one trailing
/// `.0` (spreadsheet export artifact) removed.
pub fn coerce_id(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
}

pub fn parse_service_id(raw: &str) -> Option<i64> {
    coerce_id(raw).parse::<i64>().ok()
}

pub fn resolve_columns<'a, I>(
    headers: I,
    aliases: &ColumnAliases,
    require_service_name: bool,
) -> HarnessResult<ColumnMap>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized: Vec<String> = headers.into_iter().map(normalize_header).collect();

    let find = |field: LogicalField| -> Option<usize> {
        aliases
            .for_field(field)
            .iter()
            .find_map(|alias| normalized.iter().position(|h| h == alias))
    };
    let missing = |field: LogicalField| HarnessError::MissingColumn {
        field: field.name().to_string(),
        tried: aliases.for_field(field).to_vec(),
    };

    let intent = find(LogicalField::Intent).ok_or_else(|| missing(LogicalField::Intent))?;
    let service_id =
        find(LogicalField::ServiceId).ok_or_else(|| missing(LogicalField::ServiceId))?;
    let service_name = find(LogicalField::ServiceName);
    if require_service_name && service_name.is_none() {
        return Err(missing(LogicalField::ServiceName));
    }

    Ok(ColumnMap {
        intent,
        service_id,
        service_name,
    })
}

/// Load every admissible record from `path` into memory.
pub fn load_records(path: &Path, options: &LoaderOptions) -> HarnessResult<LoadedRecords> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            HarnessError::Io(format!("CSV not found: {}", path.display()))
        }
        _ => HarnessError::Io(format!("Failed to read CSV {}: {}", path.display(), e)),
    })?;
    parse_records(&content, options)
        .map_err(|e| match e {
            HarnessError::MissingHeader(_) => {
                HarnessError::MissingHeader(path.display().to_string())
            }
            other => other,
        })
}

/// Same as [`load_records`] but over in-memory CSV text.
pub fn parse_records(content: &str, options: &LoaderOptions) -> HarnessResult<LoadedRecords> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(HarnessError::MissingHeader("<input>".to_string()));
    }
    let columns = resolve_columns(headers.iter(), &options.aliases, options.require_service_name)?;
    debug!(?columns, "resolved CSV columns");

    let mut loaded = LoadedRecords::default();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable CSV row: {}", e);
                continue;
            }
        };
        let line_number = row.position().map(|p| p.line() as usize).unwrap_or(0);
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        let raw_id = field(columns.service_id);
        let Some(expected_service_id) = parse_service_id(raw_id) else {
            debug!(line = line_number, id = raw_id, "skipping row with non-integer id");
            loaded.skipped_invalid_id += 1;
            continue;
        };

        let intent = field(columns.intent);
        if intent.is_empty() {
            warn!(line = line_number, "Skipping row without intent text");
            loaded.skipped_empty_intent.push(line_number);
            continue;
        }

        let service_name = columns
            .service_name
            .map(|idx| field(idx).to_string())
            .filter(|name| !name.is_empty());

        loaded.records.push(TestRecord {
            line_number,
            expected_service_id,
            service_name,
            intent: intent.to_string(),
        });

        if options.max_rows > 0 && loaded.records.len() >= options.max_rows {
            debug!(max_rows = options.max_rows, "row cap reached");
            break;
        }
    }

    Ok(loaded)
}
