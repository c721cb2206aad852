//! Aggregation over the source registry.
//!
//! This module runs the concurrent fan-out and derives the station-filter
//! queries used by the lookup commands.

pub mod aggregator;
pub mod stations;

pub use aggregator::*;
pub use stations::{parse_icao, parse_route, parse_stations, station_query};
