//! Bounded-timeout fetching of a single upstream source.

use crate::error::{clip_body, FetchError};
use crate::models::{FetchOutcome, ParamMap, Payload};
use crate::sources::params::to_query_pairs;
use crate::sources::registry::Source;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request timeout for upstream sources.
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 20;

/// Configuration for the source fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_SOURCE_TIMEOUT_SECS,
            user_agent: format!("skybrief/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Issues one GET per source and normalizes the outcome.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    config: FetcherConfig,
    http_client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(config: FetcherConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.config.timeout_seconds
    }

    /// Fetch one source. Never fails: errors become `FetchOutcome::Failure`.
    pub async fn fetch(&self, source: &Source, params: &ParamMap) -> FetchOutcome {
        match self.try_fetch(source, params).await {
            Ok(payload) => {
                if payload.is_raw_text() {
                    debug!("{} returned non-JSON body, wrapped as text", source.name);
                }
                FetchOutcome::Success(payload)
            }
            Err(e) => {
                warn!("{} fetch failed: {}", source.name, e);
                FetchOutcome::Failure {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn try_fetch(&self, source: &Source, params: &ParamMap) -> Result<Payload, FetchError> {
        debug!("GET {} with {} params", source.endpoint, params.len());

        let response = self
            .http_client
            .get(&source.endpoint)
            .query(&to_query_pairs(params))
            .header(ACCEPT, "application/json")
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| self.classify(&source.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: clip_body(&body),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout_seconds)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(Payload::from_body(&body))
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
