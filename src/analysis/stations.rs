//! Station identifier validation and station-filter queries.

use crate::error::InputError;
use crate::models::Query;
use serde_json::Value;

/// Query key the upstream API uses for station filters.
pub const STATION_FILTER_KEY: &str = "ids";

/// Normalize and validate a single ICAO code (exactly 4 letters).
pub fn parse_icao(code: &str) -> Result<String, InputError> {
    let normalized = code.trim().to_ascii_uppercase();

    if normalized.len() == 4 && normalized.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(normalized)
    } else {
        Err(InputError::InvalidIcao(code.trim().to_string()))
    }
}

/// Parse a comma-separated list of ICAO codes.
pub fn parse_route(route: &str) -> Result<Vec<String>, InputError> {
    parse_code_list(route).map_err(InputError::InvalidRoute)
}

/// Parse the comma-separated station filter of a briefing.
pub fn parse_stations(stations: &str) -> Result<Vec<String>, InputError> {
    parse_code_list(stations).map_err(InputError::InvalidStations)
}

fn parse_code_list(list: &str) -> Result<Vec<String>, String> {
    if list.trim().is_empty() {
        return Err("use comma-separated ICAO codes (e.g., KJFK,KLAX)".to_string());
    }

    let mut codes = Vec::new();
    let mut invalid = Vec::new();

    for part in list.split(',') {
        match parse_icao(part) {
            Ok(code) => codes.push(code),
            Err(_) => invalid.push(part.trim().to_string()),
        }
    }

    if invalid.is_empty() {
        Ok(codes)
    } else {
        Err(format!("invalid ICAO codes: {}", invalid.join(", ")))
    }
}

/// Query that filters every source to the given stations.
pub fn station_query(codes: &[String]) -> Query {
    let mut query = Query::new();
    query.insert(
        STATION_FILTER_KEY.to_string(),
        Value::String(codes.join(",")),
    );
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_icao() {
        assert_eq!(parse_icao("kjfk").unwrap(), "KJFK");
        assert_eq!(parse_icao(" EGLL ").unwrap(), "EGLL");
        assert!(parse_icao("JFK").is_err());
        assert!(parse_icao("K1FK").is_err());
        assert!(parse_icao("KJFKX").is_err());
        assert!(parse_icao("").is_err());
    }

    #[test]
    fn test_parse_route() {
        assert_eq!(
            parse_route("kjfk, klax,KORD").unwrap(),
            vec!["KJFK", "KLAX", "KORD"]
        );

        let err = parse_route("KJFK,LAX,12AB").unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidRoute("invalid ICAO codes: LAX, 12AB".to_string())
        );

        assert!(parse_route("   ").is_err());
        assert!(parse_route("KJFK,").is_err());
    }

    #[test]
    fn test_parse_stations() {
        assert_eq!(parse_stations("kjfk,KLAX").unwrap(), vec!["KJFK", "KLAX"]);

        let err = parse_stations("KJFK,LAX").unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidStations("invalid ICAO codes: LAX".to_string())
        );
        assert_eq!(
            err.to_string(),
            "invalid stations: invalid ICAO codes: LAX"
        );
        assert!(parse_stations("").is_err());
    }

    #[test]
    fn test_station_query() {
        let query = station_query(&["KJFK".to_string(), "KLAX".to_string()]);
        assert_eq!(serde_json::Value::Object(query), json!({"ids": "KJFK,KLAX"}));
    }
}
