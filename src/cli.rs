//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::error::InputError;
use crate::models::Query;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SkyBrief - aviation weather aggregator with AI priority briefings
///
/// Fetches every aviation weather source concurrently, tolerates partial
/// failure, and condenses the result into at most six priority bullets.
///
/// Examples:
///   skybrief summary --stations KJFK,KLAX
///   skybrief summary --query '{"metar": {"hours": 5}, "ids": "KBOS"}'
///   skybrief station KJFK --format json
///   skybrief route KJFK,KORD,KLAX
///   skybrief health
///   skybrief --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// API key for the summarization backend
    ///
    /// Without a key, a fixed fallback summary is produced and the backend
    /// is never called.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model used for summarization
    #[arg(short, long, env = "SKYBRIEF_MODEL", global = true)]
    pub model: Option<String>,

    /// Chat-completions endpoint of the summarization backend
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Base URL of the aviation weather data API
    #[arg(long, value_name = "URL", env = "SKYBRIEF_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Per-source request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Output file path (stdout when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .skybrief.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .skybrief.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Operations exposed by the tool.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Aggregate all sources and produce a priority briefing
    Summary {
        /// Comma-separated ICAO codes used as the station filter
        #[arg(short, long, value_name = "ICAOS")]
        stations: Option<String>,

        /// JSON object of overrides keyed by source name or global key
        #[arg(long, value_name = "JSON", conflicts_with = "query_file")]
        query: Option<String>,

        /// File containing the JSON overrides object
        #[arg(long, value_name = "FILE")]
        query_file: Option<PathBuf>,

        /// Show the resolved per-source parameters without any network call
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch all sources for a single station
    Station {
        /// ICAO code (e.g., KJFK)
        icao: String,
    },

    /// Fetch all sources for every station on a route
    Route {
        /// Comma-separated ICAO codes (e.g., KJFK,KLAX)
        route: String,
    },

    /// Check which sources are reachable
    Health,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown format
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required (summary, station, route, health)".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        for url in [&self.base_url, &self.api_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("URL must start with 'http://' or 'https://': {}", url));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Parse caller overrides from inline JSON or a file.
pub fn load_query(inline: Option<&str>, file: Option<&PathBuf>) -> Result<Query> {
    let text = match (inline, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path.display()))?,
        (None, None) => return Ok(Query::new()),
    };

    parse_query(&text)
}

/// Parse a JSON object of overrides.
pub fn parse_query(text: &str) -> Result<Query> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("Query is not valid JSON")?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(InputError::InvalidQuery(json_kind(&other).to_string()).into()),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
