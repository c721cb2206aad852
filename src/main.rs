//! SkyBrief - aviation weather aggregator with AI priority briefings
//!
//! A CLI tool that fetches every aviation weather source concurrently,
//! tolerates partial upstream failure, and condenses the result into a
//! short list of priority bullets.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid input, config, output write, etc.)
//!   2 - Health check found at least one unhealthy source

mod analysis;
mod briefing;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod sources;

use analysis::{
    failed_sources, parse_icao, parse_route, parse_stations, station_query, Aggregator,
};
use anyhow::{Context, Result};
use briefing::Summarizer;
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{
    AggregationResult, HealthReport, Query, RouteResponse, StationResponse, SummaryResponse,
};
use serde_json::Value;
use sources::{SourceFetcher, SourceRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Station used by the health probe.
const HEALTH_PROBE_STATION: &str = "KJFK";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(log_level(&args, &config));

    info!("SkyBrief v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .skybrief.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the data API, timeouts, and backend model.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the rendered result.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Log level from the flags, raised to debug by a verbose config file.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Run the selected command. Returns the process exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let registry = Arc::new(SourceRegistry::standard(&config.sources.base_url)?);
    let fetcher = SourceFetcher::new(config.fetcher_config())?;
    info!(
        "{} sources at {} ({}s timeout each)",
        registry.len(),
        config.sources.base_url,
        fetcher.timeout_seconds()
    );
    let aggregator = Aggregator::new(registry, fetcher);

    let Some(command) = args.command.clone() else {
        anyhow::bail!("A command is required (summary, station, route, health)");
    };

    let (output, exit_code) = match command {
        Command::Summary {
            stations,
            query,
            query_file,
            dry_run,
        } => {
            let mut query = cli::load_query(query.as_deref(), query_file.as_ref())?;
            let stations = match stations {
                Some(ref list) => parse_stations(list)?,
                None => Vec::new(),
            };
            if !stations.is_empty() {
                query.extend(station_query(&stations));
            }

            if dry_run {
                (render_plan(&aggregator, &query)?, 0)
            } else {
                (run_summary(&args, &config, &aggregator, &query, stations).await?, 0)
            }
        }
        Command::Station { icao } => {
            let icao = parse_icao(&icao)?;
            let result = aggregate(&args, &aggregator, &station_query(&[icao.clone()])).await;
            let response = StationResponse {
                icao,
                data: result.data,
                errors: result.errors,
            };
            let output = match args.format {
                OutputFormat::Json => report::generate_json_report(&response)?,
                OutputFormat::Markdown => report::generate_markdown_station(&response),
            };
            (output, 0)
        }
        Command::Route { route } => {
            let route = parse_route(&route)?;
            let result = aggregate(&args, &aggregator, &station_query(&route)).await;
            let response = RouteResponse {
                route,
                data: result.data,
                errors: result.errors,
            };
            let output = match args.format {
                OutputFormat::Json => report::generate_json_report(&response)?,
                OutputFormat::Markdown => report::generate_markdown_route(&response),
            };
            (output, 0)
        }
        Command::Health => {
            let result = aggregate(&args, &aggregator, &health_query()).await;
            let health = HealthReport::from_result(&result);
            let exit_code = if health.all_healthy() { 0 } else { 2 };
            let output = match args.format {
                OutputFormat::Json => report::generate_json_report(&health)?,
                OutputFormat::Markdown => report::generate_markdown_health(&health),
            };
            (output, exit_code)
        }
    };

    write_output(config.general.output.as_deref(), &output)?;

    if exit_code == 2 {
        eprintln!("\n⛔ One or more sources are unhealthy (exit code 2).");
    }

    Ok(exit_code)
}

/// Aggregate all sources and summarize them.
async fn run_summary(
    args: &Args,
    config: &Config,
    aggregator: &Aggregator,
    query: &Query,
    stations: Vec<String>,
) -> Result<String> {
    let summarizer = Summarizer::new(config.summarizer_config(), args.api_key.clone())?;
    if summarizer.is_configured() {
        info!("Summarizing with model {}", config.backend.model);
    }

    let result = aggregate(args, aggregator, query).await;

    let spinner = start_spinner(args, "Generating briefing...");
    let summary = summarizer.summarize(&result).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    if summary.is_empty() {
        warn!("Summary has no bullets");
    }

    let model_used = summarizer.model_used().map(str::to_string);
    let response = SummaryResponse::new(summary, result, stations, model_used);

    match args.format {
        OutputFormat::Json => report::generate_json_report(&response),
        OutputFormat::Markdown => Ok(report::generate_markdown_briefing(&response)),
    }
}

/// Run one fan-out with a progress spinner and log partial failures.
async fn aggregate(args: &Args, aggregator: &Aggregator, query: &Query) -> AggregationResult {
    let start_time = Instant::now();
    let spinner = start_spinner(args, "Fetching aviation weather sources...");

    let result = aggregator.aggregate(query).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let failed = failed_sources(&result);
    if !failed.is_empty() {
        warn!("Sources failed: {}", failed.join(", "));
    }
    debug!(
        "Fetched {} sources in {:.1}s",
        result.source_count(),
        start_time.elapsed().as_secs_f64()
    );

    result
}

/// Handle --dry-run: show the resolved parameters, make no request.
fn render_plan(aggregator: &Aggregator, query: &Query) -> Result<String> {
    let mut plan = serde_json::Map::new();
    for planned in aggregator.plan(query) {
        plan.insert(
            planned.source.name.clone(),
            serde_json::json!({
                "endpoint": planned.source.endpoint,
                "group": format!("{:?}", planned.source.group).to_lowercase(),
                "class": planned.source.class.to_string(),
                "params": Value::Object(planned.params),
            }),
        );
    }

    eprintln!("🔍 Dry run: no upstream or backend calls were made.");
    serde_json::to_string_pretty(&Value::Object(plan)).map_err(Into::into)
}

/// Query used to probe every source.
fn health_query() -> Query {
    let mut query = station_query(&[HEALTH_PROBE_STATION.to_string()]);
    query.insert("hours".to_string(), Value::from(1));
    query
}

fn start_spinner(args: &Args, message: &str) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Write the rendered result to a file or stdout.
fn write_output(path: Option<&str>, output: &str) -> Result<()> {
    match path {
        Some(path) => {
            let path = PathBuf::from(path);
            std::fs::write(&path, output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            eprintln!("✅ Output saved to: {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_health_query() {
        let query = health_query();
        assert_eq!(query.get("ids"), Some(&Value::from("KJFK")));
        assert_eq!(query.get("hours"), Some(&Value::from(1)));
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let args = Args::try_parse_from(["skybrief", "health"]).unwrap();
        let mut config = Config::default();
        assert_eq!(log_level(&args, &config), tracing::Level::INFO);

        config.general.verbose = true;
        assert_eq!(log_level(&args, &config), tracing::Level::DEBUG);

        let quiet = Args::try_parse_from(["skybrief", "health", "--quiet"]).unwrap();
        assert_eq!(log_level(&quiet, &config), tracing::Level::ERROR);
    }

    #[test]
    fn test_dry_run_plan_makes_no_requests() {
        let registry = Arc::new(SourceRegistry::standard("http://127.0.0.1:9/api").unwrap());
        let fetcher = SourceFetcher::new(Default::default()).unwrap();
        let aggregator = Aggregator::new(registry, fetcher);

        let mut query = station_query(&["KJFK".to_string()]);
        query.insert("metar".to_string(), serde_json::json!({"hours": 5}));

        let plan: Value = serde_json::from_str(&render_plan(&aggregator, &query).unwrap()).unwrap();
        assert_eq!(plan["metar"]["params"]["hours"], Value::from(5));
        assert_eq!(plan["metar"]["params"]["ids"], Value::from("KJFK"));
        assert_eq!(plan["metar"]["class"], Value::from("primary report"));
        assert_eq!(plan["taf"]["params"]["hours"], Value::from(2));
        assert_eq!(plan["pirep"]["params"]["hours"], Value::from(4));
        assert_eq!(plan.as_object().map(|p| p.len()), Some(aggregator.registry().len()));
        assert_eq!(plan["notam"]["group"], Value::from("supplementary"));
        assert!(plan["notam"]["params"].get("format").is_none());
    }
}
