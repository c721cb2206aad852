//! Typed error definitions.
//!
//! Source and backend errors never escape the core: they are rendered to
//! strings and recorded in the aggregation result or the summary. Input
//! errors belong to the command-line boundary.

use thiserror::Error;

/// Failure while fetching a single upstream source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Failure while calling the generative-text backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("backend response contained no choices")]
    NoChoices,
}

/// Invalid caller input rejected before the core runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid ICAO code '{0}': must be 4 letters (e.g., KJFK)")]
    InvalidIcao(String),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("invalid stations: {0}")]
    InvalidStations(String),

    #[error("query must be a JSON object, got {0}")]
    InvalidQuery(String),
}

/// Keep error text from a response body short enough for a single line.
pub(crate) fn clip_body(body: &str) -> String {
    const MAX_BODY_CHARS: usize = 200;

    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_BODY_CHARS {
        let clipped: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
        format!("{}...", clipped)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            status: 503,
            body: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream returned HTTP 503: Service Unavailable"
        );
    }

    #[test]
    fn test_clip_body() {
        assert_eq!(clip_body("  short  "), "short");

        let long = "x".repeat(500);
        let clipped = clip_body(&long);
        assert!(clipped.ends_with("..."));
        assert_eq!(clipped.chars().count(), 203);
    }
}
