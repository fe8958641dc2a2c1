//! Sequential run loop
//!
//! Records are sent one at a time in file order. A failed row never stops the
//! run; the only early exit is the loader's row cap.

use crate::dispatch::IntentEndpoint;
use crate::loader::LoadedRecords;
use crate::strategy::{RowOutcome, RowStrategy};
use crate::summary::RunSummary;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub rows: Vec<RowOutcome>,
    pub summary: RunSummary,
}

pub struct HarnessRunner<'a> {
    endpoint: &'a dyn IntentEndpoint,
    strategy: Box<dyn RowStrategy>,
    delay: Duration,
}

impl<'a> HarnessRunner<'a> {
    pub fn new(endpoint: &'a dyn IntentEndpoint, strategy: Box<dyn RowStrategy>) -> Self {
        Self {
            endpoint,
            strategy,
            delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive requests (none after the last one).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Classify every record, calling `on_row` as soon as each outcome is known.
    pub fn run<F>(&self, loaded: &LoadedRecords, mut on_row: F) -> RunReport
    where
        F: FnMut(&RowOutcome),
    {
        let mut summary = RunSummary::new(self.strategy.mode());
        summary.record_skipped_empty_intent(loaded.skipped_empty_intent.len());

        info!(
            endpoint = %self.endpoint.describe(),
            mode = %self.strategy.mode(),
            rows = loaded.records.len(),
            "starting run"
        );

        let mut rows = Vec::with_capacity(loaded.records.len());
        for (idx, record) in loaded.records.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            let dispatched = self.endpoint.classify(&record.intent);
            let outcome = self.strategy.evaluate(record, dispatched);
            debug!(
                line = outcome.line_number,
                expected = outcome.expected_service_id,
                predicted = outcome.predicted(),
                passed = outcome.passed,
                "row classified"
            );

            summary.record(&outcome);
            on_row(&outcome);
            rows.push(outcome);
        }

        info!(
            total = summary.total,
            correct = summary.correct,
            "run finished"
        );
        RunReport { rows, summary }
    }
}
