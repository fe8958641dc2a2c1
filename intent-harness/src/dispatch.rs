//! Request dispatcher
//!
//! One blocking POST per intent, no retries. The outcome keeps the raw body so
//! both validation strategies can look at it however they need.

use crate::error::{HarnessError, HarnessResult};
use reqwest::blocking::Client as BlockingHttpClient;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct IntentRequest<'a> {
    intent: &'a str,
}

/// What came back from a single classification request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Connection error, DNS failure or timeout before a full response
    Transport {
        error: String,
        timed_out: bool,
        latency_ms: f64,
    },
    /// Any HTTP response; `json` is `None` when the body is not JSON
    Response {
        status: u16,
        body: String,
        json: Option<Value>,
        latency_ms: f64,
    },
}

impl DispatchOutcome {
    /// Build a response outcome, parsing the body as JSON when possible.
    pub fn from_body(status: u16, body: impl Into<String>, latency_ms: f64) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        DispatchOutcome::Response {
            status,
            body,
            json,
            latency_ms,
        }
    }

    pub fn latency_ms(&self) -> f64 {
        match self {
            DispatchOutcome::Transport { latency_ms, .. }
            | DispatchOutcome::Response { latency_ms, .. } => *latency_ms,
        }
    }
}

/// Anything that can classify an intent. The HTTP dispatcher is the real one;
/// tests plug in canned responders.
pub trait IntentEndpoint {
    fn classify(&self, intent: &str) -> DispatchOutcome;

    /// Human-readable target, used in logs and reports
    fn describe(&self) -> String;
}

/// Result of the optional pre-flight probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy(u16),
    UnexpectedStatus(u16),
}

pub struct HttpDispatcher {
    client: BlockingHttpClient,
    endpoint: String,
}

impl HttpDispatcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> HarnessResult<Self> {
        let client = BlockingHttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// GET `url` once. Only a transport failure is an error; a non-2xx status
    /// is reported back and the caller decides.
    pub fn health_check(&self, url: &str) -> HarnessResult<HealthStatus> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| HarnessError::Unreachable(format!("{}: {}", url, error_chain(&e))))?;
        let status = response.status();
        if status.is_success() {
            debug!(url, status = status.as_u16(), "health check passed");
            Ok(HealthStatus::Healthy(status.as_u16()))
        } else {
            warn!("Health check at {} answered with status {}", url, status);
            Ok(HealthStatus::UnexpectedStatus(status.as_u16()))
        }
    }
}

impl IntentEndpoint for HttpDispatcher {
    fn classify(&self, intent: &str) -> DispatchOutcome {
        let started = Instant::now();
        let elapsed_ms = |started: Instant| started.elapsed().as_secs_f64() * 1000.0;

        let sent = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&IntentRequest { intent })
            .send();

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "request failed");
                return DispatchOutcome::Transport {
                    error: error_chain(&e),
                    timed_out: e.is_timeout(),
                    latency_ms: elapsed_ms(started),
                };
            }
        };

        let status = response.status().as_u16();
        match response.text() {
            Ok(body) => DispatchOutcome::from_body(status, body, elapsed_ms(started)),
            Err(e) => DispatchOutcome::Transport {
                error: error_chain(&e),
                timed_out: e.is_timeout(),
                latency_ms: elapsed_ms(started),
            },
        }
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// reqwest's top-level message hides the interesting part ("connection
/// refused", "operation timed out") in the source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
