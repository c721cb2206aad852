//! Briefing summarizer backed by a chat-completions endpoint.
//!
//! Two entry conditions:
//! - No credential: a fixed two-line fallback, no network call.
//! - Credential present: one backend call; its bulleted output becomes
//!   the summary, capped at six bullets. Backend failures are reported
//!   as a single bullet instead of an error.

use crate::briefing::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::error::{clip_body, BackendError};
use crate::models::{AggregationResult, Summary};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder value shipped in example environment files.
const PLACEHOLDER_API_KEY: &str = "your-openai-api-key-here";

/// Configuration for the summarization backend.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model_name: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 400,
            timeout_seconds: 30,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completions API request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat-completions API response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Produces briefing summaries from aggregated source data.
pub struct Summarizer {
    config: SummarizerConfig,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl Summarizer {
    /// Create a summarizer. An absent, empty or placeholder key selects
    /// the fallback path.
    pub fn new(config: SummarizerConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let api_key = normalize_api_key(api_key);
        info!(
            "Summarization backend configured: {}",
            if api_key.is_some() { "yes" } else { "no (fallback summary)" }
        );

        let http_client = reqwest::Client::builder().build()?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model that will produce the summary, if any.
    pub fn model_used(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|_| self.config.model_name.as_str())
    }

    /// Summarize an aggregation result. Never fails.
    pub async fn summarize(&self, result: &AggregationResult) -> Summary {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("No backend credential, using fallback summary");
            return fallback_summary();
        };

        let prompt = build_prompt(result);
        debug!("Prompt is {} characters", prompt.chars().count());

        match self.complete(api_key, &prompt).await {
            Ok(text) => {
                let summary = parse_bullets(&text);
                info!("Backend returned {} bullets", summary.len());
                summary
            }
            Err(e) => {
                warn!("AI summarization failed: {}", e);
                failure_summary(&e)
            }
        }
    }

    /// Send the prompt and return the generated message text.
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, BackendError> {
        let request = ChatCompletionRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.config.timeout_seconds)
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: clip_body(&body),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .ok_or(BackendError::NoChoices)?
            .message
            .content
            .ok_or_else(|| BackendError::Malformed("message has no content".to_string()))
    }
}

/// Treat empty and placeholder keys as absent.
fn normalize_api_key(api_key: Option<String>) -> Option<String> {
    api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
}

/// Fixed summary used when no backend credential is configured.
pub fn fallback_summary() -> Summary {
    Summary::new(vec![
        "[SUMMARY] AI summarization unavailable: no backend API key configured.".to_string(),
        "Review SIGMET/PIREP/METAR/TAF in the raw data for details.".to_string(),
    ])
}

/// Single-bullet summary describing a backend failure.
pub fn failure_summary(error: &BackendError) -> Summary {
    Summary::new(vec![format!("AI summarization failed: {}", error)])
}

/// Extract bullet lines from generated text.
///
/// Lines starting with `-` or `*` become bullets with markers and
/// surrounding whitespace removed. Without any bullets the whole text is
/// a single entry. At most six entries are kept.
pub fn parse_bullets(text: &str) -> Summary {
    let bullets: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-') || line.starts_with('*'))
        .map(|line| {
            line.trim_matches(|c: char| c == '-' || c == '*' || c.is_whitespace())
                .to_string()
        })
        .filter(|bullet| !bullet.is_empty())
        .collect();

    if bullets.is_empty() {
        Summary::new(vec![text.trim().to_string()])
    } else {
        Summary::new(bullets)
    }
}
