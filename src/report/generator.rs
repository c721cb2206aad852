//! Markdown and JSON rendering of results.
//!
//! This module renders the caller-facing envelopes produced by the
//! summary, lookup and health commands.

use crate::models::{HealthReport, Payload, RouteResponse, StationResponse, SummaryResponse};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Render any envelope as pretty-printed JSON.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a complete Markdown briefing.
pub fn generate_markdown_briefing(response: &SummaryResponse) -> String {
    let mut output = String::new();

    output.push_str("# SkyBrief Briefing\n\n");
    output.push_str(&generate_metadata_section(response));
    output.push_str(&generate_bullets_section(response.summary.bullets()));
    output.push_str(&generate_source_table(&response.raw, &response.errors));
    output.push_str(&generate_footer());

    output
}

/// Generate a Markdown report for a station or route lookup.
pub fn generate_markdown_lookup(
    title: &str,
    data: &BTreeMap<String, Payload>,
    errors: &BTreeMap<String, String>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", title));
    output.push_str(&generate_source_table(data, errors));
    output.push_str(&generate_footer());

    output
}

/// Markdown report for a single-station lookup.
pub fn generate_markdown_station(response: &StationResponse) -> String {
    generate_markdown_lookup(
        &format!("Station {}", response.icao),
        &response.data,
        &response.errors,
    )
}

/// Markdown report for a route lookup.
pub fn generate_markdown_route(response: &RouteResponse) -> String {
    generate_markdown_lookup(
        &format!("Route {}", response.route.join(" → ")),
        &response.data,
        &response.errors,
    )
}

/// Generate a Markdown health report.
pub fn generate_markdown_health(report: &HealthReport) -> String {
    let mut output = String::new();

    output.push_str("# Source Health\n\n");
    output.push_str(&format!(
        "*Checked: {}*\n\n",
        report.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str("| Source | Status |\n");
    output.push_str("|:---|:---|\n");
    for (name, status) in &report.sources {
        output.push_str(&format!("| `{}` | {} |\n", name, escape_cell(status)));
    }
    output.push('\n');

    output
}

/// Generate the metadata section.
fn generate_metadata_section(response: &SummaryResponse) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        response.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !response.stations.is_empty() {
        section.push_str(&format!(
            "- **Stations:** {}\n",
            response.stations.join(", ")
        ));
    }
    match response.model_used {
        Some(ref model) => section.push_str(&format!("- **Model Used:** `{}`\n", model)),
        None => section.push_str("- **Model Used:** none (fallback summary)\n"),
    }
    section.push_str(&format!(
        "- **Sources:** {} ok, {} failed\n",
        response.raw.len(),
        response.errors.len()
    ));
    section.push('\n');

    section
}

/// Generate the numbered priority bullets.
fn generate_bullets_section(bullets: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Priority Briefing\n\n");
    if bullets.is_empty() {
        section.push_str("No briefing items.\n\n");
        return section;
    }

    for (i, bullet) in bullets.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, bullet));
    }
    section.push('\n');

    section
}

/// Generate the per-source status table.
fn generate_source_table(
    data: &BTreeMap<String, Payload>,
    errors: &BTreeMap<String, String>,
) -> String {
    let mut rows: Vec<(&str, String)> = data
        .iter()
        .map(|(name, payload)| (name.as_str(), describe_payload(payload)))
        .chain(
            errors
                .iter()
                .map(|(name, message)| (name.as_str(), format!("❌ {}", escape_cell(message)))),
        )
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut section = String::new();
    section.push_str("## Sources\n\n");
    section.push_str("| Source | Status |\n");
    section.push_str("|:---|:---|\n");
    for (name, status) in rows {
        section.push_str(&format!("| `{}` | {} |\n", name, status));
    }
    section.push('\n');

    section
}

fn describe_payload(payload: &Payload) -> String {
    match payload {
        Payload::Structured(serde_json::Value::Array(items)) => {
            format!("✅ {} records", items.len())
        }
        Payload::Structured(_) => "✅ ok".to_string(),
        Payload::RawText(text) => format!("✅ text ({} chars)", text.chars().count()),
    }
}

/// Keep table cells on one line and free of column separators.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Briefing generated by SkyBrief. Always verify with official sources before flight.*\n");

    footer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregationResult, FetchOutcome, Summary};
    use chrono::Utc;
    use serde_json::json;

    fn create_test_response() -> SummaryResponse {
        let mut result = AggregationResult::default();
        result.record(
            "metar".to_string(),
            FetchOutcome::Success(Payload::Structured(json!([{"icaoId": "KJFK"}, {"icaoId": "KLAX"}]))),
        );
        result.record(
            "afd".to_string(),
            FetchOutcome::Success(Payload::RawText("DISCUSSION".to_string())),
        );
        result.record(
            "sigmet".to_string(),
            FetchOutcome::Failure {
                message: "upstream returned HTTP 503: a|b".to_string(),
            },
        );

        SummaryResponse::new(
            Summary::new(vec![
                "[SIGMET] Convective activity — Avoid — Reroute".to_string(),
                "[METAR KJFK] VFR — None — Proceed".to_string(),
            ]),
            result,
            vec!["KJFK".to_string(), "KLAX".to_string()],
            Some("gpt-4o-mini".to_string()),
        )
    }

    #[test]
    fn test_generate_markdown_briefing() {
        let markdown = generate_markdown_briefing(&create_test_response());

        assert!(markdown.contains("# SkyBrief Briefing"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Stations:** KJFK, KLAX"));
        assert!(markdown.contains("`gpt-4o-mini`"));
        assert!(markdown.contains("1. [SIGMET] Convective activity"));
        assert!(markdown.contains("2. [METAR KJFK]"));
        assert!(markdown.contains("| `metar` | ✅ 2 records |"));
        assert!(markdown.contains("| `afd` | ✅ text (10 chars) |"));
        assert!(markdown.contains("HTTP 503: a\\|b"));
    }

    #[test]
    fn test_fallback_model_line() {
        let mut response = create_test_response();
        response.model_used = None;
        let markdown = generate_markdown_briefing(&response);
        assert!(markdown.contains("none (fallback summary)"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_response()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["raw"]["afd"], json!({"text": "DISCUSSION"}));
        assert!(value["errors"]["sigmet"].as_str().unwrap().contains("503"));
        assert!(value["raw"].get("sigmet").is_none());
        assert_eq!(value["stations"], json!(["KJFK", "KLAX"]));
    }

    #[test]
    fn test_generate_markdown_route_and_health() {
        let route = RouteResponse {
            route: vec!["KJFK".to_string(), "KLAX".to_string()],
            data: BTreeMap::new(),
            errors: [("taf".to_string(), "timed out".to_string())].into_iter().collect(),
        };
        let markdown = generate_markdown_route(&route);
        assert!(markdown.contains("# Route KJFK → KLAX"));
        assert!(markdown.contains("| `taf` | ❌ timed out |"));

        let health = HealthReport {
            checked_at: Utc::now(),
            sources: [("metar".to_string(), "healthy".to_string())].into_iter().collect(),
        };
        assert!(generate_markdown_health(&health).contains("| `metar` | healthy |"));
    }
}
