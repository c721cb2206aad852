//! Deterministic prompt construction for the briefing backend.

use crate::models::{AggregationResult, MAX_SUMMARY_BULLETS};

/// Maximum characters of serialized source data included in a prompt.
pub const MAX_DATA_CHARS: usize = 15_000;

/// Role of the assistant, also sent as the system message.
pub const SYSTEM_INSTRUCTION: &str =
    "You are an aviation weather assistant for pilots. Prioritize and summarize aviation data.";

/// Hazard ordering, highest priority first.
pub const PRIORITY_RULES: &[&str] = &[
    "SIGMET and other severe hazard advisories (especially CONVECTIVE or SEV)",
    "PIREP reports of severe icing or turbulence",
    "METAR hazards: thunderstorms (TS), low-level wind shear (LLWS), visibility below 3SM",
    "TAF and forecasts indicating deterioration within the ETA window",
    "AFD discussion remarks",
    "Station information",
];

/// Render the full instruction payload for an aggregation result.
///
/// Only `data` is serialized; the `errors` map is left out. The serialized
/// data is cut at `MAX_DATA_CHARS` characters.
pub fn build_prompt(result: &AggregationResult) -> String {
    let mut prompt = String::new();

    prompt.push_str(SYSTEM_INSTRUCTION);
    prompt.push_str("\n\n");

    prompt.push_str("Priority order (highest first):\n");
    for (i, rule) in PRIORITY_RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }
    prompt.push('\n');

    prompt.push_str(&format!(
        "Output: concise bullet points suitable for a cockpit briefing, at most {} bullets.\n",
        MAX_SUMMARY_BULLETS
    ));
    prompt.push_str("Start each bullet with \"- \" on its own line.\n");
    prompt.push_str("Each bullet: [Source/ICAO] Finding — Impact — Action.\n");
    prompt.push_str("Use plain text.\n\n");

    prompt.push_str("DATA:\n");
    prompt.push_str(&serialized_data(result));
    prompt.push('\n');

    prompt
}

/// Serialized `data` map, truncated on a character boundary.
fn serialized_data(result: &AggregationResult) -> String {
    let json = serde_json::to_string(&result.data).unwrap_or_default();
    truncate_chars(&json, MAX_DATA_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
