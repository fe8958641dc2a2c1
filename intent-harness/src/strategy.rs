//! Row strategies
//!
//! Loose and strict validation both turn a `(TestRecord, DispatchOutcome)` pair
//! into the same `RowOutcome`, so the runner and the summary never branch on
//! the mode.

use crate::config::ValidationMode;
use crate::dispatch::DispatchOutcome;
use crate::extract::{envelope_service_id, extract_prediction, validate_envelope, Extraction};
use crate::loader::TestRecord;
use serde::Serialize;
use serde_json::Value;

/// Predicted service for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Prediction {
    Found(i64),
    NotFound,
    TransportFailure,
}

impl Prediction {
    /// Numeral used for display and pair counting: -1 on transport failure,
    /// 0 when nothing could be extracted.
    pub fn sentinel(&self) -> i64 {
        match self {
            Prediction::Found(id) => *id,
            Prediction::NotFound => 0,
            Prediction::TransportFailure => -1,
        }
    }
}

impl From<Extraction> for Prediction {
    fn from(extraction: Extraction) -> Self {
        match extraction {
            Extraction::Found(id) => Prediction::Found(id),
            Extraction::NotFound => Prediction::NotFound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub prediction: Prediction,
    pub latency_ms: f64,
    /// Only set when the request never produced a response
    pub raw_error_text: Option<String>,
}

/// Why a row did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    HttpStatus,
    InvalidJson,
    Validation,
    Mismatch,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport error",
            FailureKind::HttpStatus => "HTTP status",
            FailureKind::InvalidJson => "invalid JSON",
            FailureKind::Validation => "validation",
            FailureKind::Mismatch => "mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub line_number: usize,
    pub expected_service_id: i64,
    pub service_name: Option<String>,
    pub intent: String,
    pub result: ClassificationResult,
    pub passed: bool,
    pub failure: Option<FailureKind>,
    pub reason: Option<String>,
    /// Parsed response payload, kept for strict-mode diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl RowOutcome {
    fn new(record: &TestRecord, result: ClassificationResult) -> Self {
        Self {
            line_number: record.line_number,
            expected_service_id: record.expected_service_id,
            service_name: record.service_name.clone(),
            intent: record.intent.clone(),
            result,
            passed: false,
            failure: None,
            reason: None,
            payload: None,
        }
    }

    fn fail(mut self, kind: FailureKind, reason: impl Into<String>) -> Self {
        self.passed = false;
        self.failure = Some(kind);
        self.reason = Some(reason.into());
        self
    }

    fn pass(mut self) -> Self {
        self.passed = true;
        self.failure = None;
        self.reason = None;
        self
    }

    pub fn predicted(&self) -> i64 {
        self.result.prediction.sentinel()
    }
}

/// Judges one classification response against its record.
pub trait RowStrategy {
    fn mode(&self) -> ValidationMode;

    fn evaluate(&self, record: &TestRecord, outcome: DispatchOutcome) -> RowOutcome;
}

/// Shared handling of transport failures: sentinel -1, error text kept.
fn transport_failure(
    record: &TestRecord,
    error: String,
    timed_out: bool,
    latency_ms: f64,
) -> RowOutcome {
    let kind = if timed_out {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    };
    let result = ClassificationResult {
        prediction: Prediction::TransportFailure,
        latency_ms,
        raw_error_text: Some(error.clone()),
    };
    RowOutcome::new(record, result).fail(kind, error)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LooseStrategy;

impl RowStrategy for LooseStrategy {
    fn mode(&self) -> ValidationMode {
        ValidationMode::Loose
    }

    fn evaluate(&self, record: &TestRecord, outcome: DispatchOutcome) -> RowOutcome {
        match outcome {
            DispatchOutcome::Transport {
                error,
                timed_out,
                latency_ms,
            } => transport_failure(record, error, timed_out, latency_ms),
            DispatchOutcome::Response {
                body,
                json,
                latency_ms,
                ..
            } => {
                let prediction: Prediction = extract_prediction(&body, json.as_ref()).into();
                let result = ClassificationResult {
                    prediction,
                    latency_ms,
                    raw_error_text: None,
                };
                let row = RowOutcome::new(record, result);
                if prediction == Prediction::Found(record.expected_service_id) {
                    row.pass()
                } else {
                    let reason = format!(
                        "expected {}, got {}",
                        record.expected_service_id,
                        prediction.sentinel()
                    );
                    row.fail(FailureKind::Mismatch, reason)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrictStrategy;

impl RowStrategy for StrictStrategy {
    fn mode(&self) -> ValidationMode {
        ValidationMode::Strict
    }

    fn evaluate(&self, record: &TestRecord, outcome: DispatchOutcome) -> RowOutcome {
        let (status, body, json, latency_ms) = match outcome {
            DispatchOutcome::Transport {
                error,
                timed_out,
                latency_ms,
            } => return transport_failure(record, error, timed_out, latency_ms),
            DispatchOutcome::Response {
                status,
                body,
                json,
                latency_ms,
            } => (status, body, json, latency_ms),
        };

        let prediction = json
            .as_ref()
            .and_then(envelope_service_id)
            .map(Prediction::Found)
            .unwrap_or(Prediction::NotFound);
        let result = ClassificationResult {
            prediction,
            latency_ms,
            raw_error_text: None,
        };
        let mut row = RowOutcome::new(record, result);

        let Some(payload) = json else {
            let snippet: String = body.chars().take(300).collect();
            return row.fail(
                FailureKind::InvalidJson,
                format!("response is not JSON (status {}): {}", status, snippet),
            );
        };

        if !(200..300).contains(&status) {
            let reason = format!("HTTP status {}", status);
            row.payload = Some(payload);
            return row.fail(FailureKind::HttpStatus, reason);
        }

        let expected_id = record.expected_service_id.to_string();
        let expected_name = record.service_name.as_deref().unwrap_or("");
        let verdict = validate_envelope(&payload, &expected_id, expected_name);
        row.payload = Some(payload);
        match verdict {
            Ok(()) => row.pass(),
            Err(reason) => row.fail(FailureKind::Validation, reason),
        }
    }
}

pub fn strategy_for(mode: ValidationMode) -> Box<dyn RowStrategy> {
    match mode {
        ValidationMode::Loose => Box::new(LooseStrategy),
        ValidationMode::Strict => Box::new(StrictStrategy),
    }
}
