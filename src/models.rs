//! Data models for the briefing pipeline.
//!
//! This module contains the core data structures that flow from the
//! source fetcher through aggregation to the caller-facing envelopes.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller-supplied overrides keyed by source name or global key.
pub type Query = serde_json::Map<String, Value>;

/// Final query parameters for one source request.
pub type ParamMap = serde_json::Map<String, Value>;

/// Maximum number of bullets in a summary.
pub const MAX_SUMMARY_BULLETS: usize = 6;

/// Body returned by an upstream source.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body decoded as JSON.
    Structured(Value),
    /// Body that was not valid JSON, kept verbatim.
    RawText(String),
}

impl Payload {
    /// Decode a response body, falling back to raw text when it is not JSON.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Payload::Structured(value),
            Err(_) => Payload::RawText(body.to_string()),
        }
    }

    /// Returns true if the body was wrapped as raw text.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Payload::RawText(_))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Structured(value) => value.serialize(serializer),
            Payload::RawText(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("text", text)?;
                map.end()
            }
        }
    }
}

/// Outcome of fetching one source.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Payload),
    Failure { message: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

/// Merged outcomes of one fan-out over the whole registry.
///
/// Every registered source appears in exactly one of `data` or `errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    /// Payloads of sources that succeeded.
    pub data: BTreeMap<String, Payload>,
    /// Failure descriptions of sources that did not.
    pub errors: BTreeMap<String, String>,
}

impl AggregationResult {
    /// Record one source outcome.
    pub fn record(&mut self, name: String, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Success(payload) => {
                self.data.insert(name, payload);
            }
            FetchOutcome::Failure { message } => {
                self.errors.insert(name, message);
            }
        }
    }

    /// Total number of sources recorded.
    pub fn source_count(&self) -> usize {
        self.data.len() + self.errors.len()
    }
}

/// Ordered, capped list of briefing bullets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Summary(Vec<String>);

impl Summary {
    /// Build a summary, keeping only the first `MAX_SUMMARY_BULLETS` entries.
    pub fn new(mut bullets: Vec<String>) -> Self {
        bullets.truncate(MAX_SUMMARY_BULLETS);
        Self(bullets)
    }

    pub fn bullets(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Response of the aggregate-and-summarize operation.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub summary: Summary,
    pub errors: BTreeMap<String, String>,
    pub raw: BTreeMap<String, Payload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stations: Vec<String>,
    /// Model used, or None when the fallback summary was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl SummaryResponse {
    pub fn new(
        summary: Summary,
        result: AggregationResult,
        stations: Vec<String>,
        model_used: Option<String>,
    ) -> Self {
        Self {
            summary,
            errors: result.errors,
            raw: result.data,
            stations,
            model_used,
            generated_at: Utc::now(),
        }
    }
}

/// Response of a single-station lookup.
#[derive(Debug, Clone, Serialize)]
pub struct StationResponse {
    pub icao: String,
    pub data: BTreeMap<String, Payload>,
    pub errors: BTreeMap<String, String>,
}

/// Response of a route lookup.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub route: Vec<String>,
    pub data: BTreeMap<String, Payload>,
    pub errors: BTreeMap<String, String>,
}

/// Reachability of every registered source.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub checked_at: DateTime<Utc>,
    pub sources: BTreeMap<String, String>,
}

impl HealthReport {
    pub fn from_result(result: &AggregationResult) -> Self {
        let mut sources = BTreeMap::new();
        for name in result.data.keys() {
            sources.insert(name.clone(), "healthy".to_string());
        }
        for (name, message) in &result.errors {
            sources.insert(name.clone(), format!("unhealthy: {}", message));
        }

        Self {
            checked_at: Utc::now(),
            sources,
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.sources.values().all(|status| status == "healthy")
    }
}
