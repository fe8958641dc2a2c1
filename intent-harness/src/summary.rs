//! Run summary accumulator
//!
//! Updated once per admitted row in file order and read once at the end.

use crate::config::ValidationMode;
use crate::error::{EXIT_OK, EXIT_VALIDATION_FAILED};
use crate::strategy::{FailureKind, RowOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One `(expected, predicted)` pair and how often it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub expected: i64,
    pub predicted: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: ValidationMode,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub correct: usize,
    /// Rows the loader dropped for an empty intent (not part of `total`)
    pub skipped_empty_intent: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    /// Failed rows grouped by expected service name
    pub failures_by_service: BTreeMap<String, usize>,
    #[serde(skip)]
    pair_counts: HashMap<(i64, i64), usize>,
}

impl RunSummary {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            total: 0,
            correct: 0,
            skipped_empty_intent: 0,
            failures_by_kind: BTreeMap::new(),
            failures_by_service: BTreeMap::new(),
            pair_counts: HashMap::new(),
        }
    }

    pub fn record(&mut self, outcome: &RowOutcome) {
        self.total += 1;
        *self
            .pair_counts
            .entry((outcome.expected_service_id, outcome.predicted()))
            .or_insert(0) += 1;

        if outcome.passed {
            self.correct += 1;
            return;
        }

        let kind = outcome.failure.unwrap_or(FailureKind::Mismatch);
        *self.failures_by_kind.entry(kind).or_insert(0) += 1;
        let service = outcome
            .service_name
            .clone()
            .unwrap_or_else(|| outcome.expected_service_id.to_string());
        *self.failures_by_service.entry(service).or_insert(0) += 1;
    }

    pub fn record_skipped_empty_intent(&mut self, count: usize) {
        self.skipped_empty_intent += count;
    }

    pub fn failed(&self) -> usize {
        self.total - self.correct
    }

    /// Percentage of correct rows, `None` when nothing was counted.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64 * 100.0)
        }
    }

    pub fn pair_count(&self, expected: i64, predicted: i64) -> usize {
        self.pair_counts
            .get(&(expected, predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Most frequent mismatching pairs, highest count first. Ties are ordered
    /// by pair so the output is stable between runs.
    pub fn top_mismatches(&self, cap: usize) -> Vec<PairCount> {
        let mut pairs: Vec<PairCount> = self
            .pair_counts
            .iter()
            .filter(|((expected, predicted), _)| expected != predicted)
            .map(|(&(expected, predicted), &count)| PairCount {
                expected,
                predicted,
                count,
            })
            .collect();
        pairs.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(a.expected.cmp(&b.expected))
                .then(a.predicted.cmp(&b.predicted))
        });
        pairs.truncate(cap);
        pairs
    }

    /// Whether the run should exit cleanly. Loose mode is a report only;
    /// strict mode fails on any failed or skipped-empty row.
    pub fn is_success(&self) -> bool {
        match self.mode {
            ValidationMode::Loose => true,
            ValidationMode::Strict => self.failed() == 0 && self.skipped_empty_intent == 0,
        }
    }

    /// Process exit code for a finished run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_OK
        } else {
            EXIT_VALIDATION_FAILED
        }
    }
}
