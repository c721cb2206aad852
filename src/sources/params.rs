//! Per-source query parameter resolution.
//!
//! Precedence for each key: the source's own override block, then scalar
//! global entries of the query, then the class defaults. A key supplied by
//! the caller is never replaced, even when its value is empty or null.

use crate::models::{ParamMap, Query};
use crate::sources::registry::{Source, SourceClass};
use serde_json::Value;

/// Fill in class defaults for any key absent from `overrides`.
pub fn build_params(class: SourceClass, overrides: &ParamMap) -> ParamMap {
    let mut params = overrides.clone();

    for (key, value) in class.default_params() {
        if !params.contains_key(key) {
            params.insert(key.to_string(), value);
        }
    }

    params
}

/// Collect the caller overrides that apply to `source`.
///
/// Object values are override blocks for the source of that name, so only
/// non-object entries are treated as global fallbacks.
pub fn resolve_overrides(source: &Source, query: &Query) -> ParamMap {
    let mut overrides = match query.get(&source.name) {
        Some(Value::Object(block)) => block.clone(),
        _ => ParamMap::new(),
    };

    for (key, value) in query {
        if value.is_object() || overrides.contains_key(key) {
            continue;
        }
        overrides.insert(key.clone(), value.clone());
    }

    overrides
}

/// Final parameters for one source request.
pub fn params_for(source: &Source, query: &Query) -> ParamMap {
    build_params(source.class, &resolve_overrides(source, query))
}

/// Encode parameters as query-string pairs.
///
/// Arrays are joined with commas (e.g. a station list), null becomes an
/// empty value and nested objects are sent as compact JSON.
pub fn to_query_pairs(params: &ParamMap) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(encode_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}
