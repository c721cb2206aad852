//! The fixed registry of upstream data sources.
//!
//! The registry is built once at startup and shared read-only with the
//! aggregator. Tests build smaller registries pointed at a mock server.

use anyhow::{ensure, Result};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;

/// Default base URL of the aviation weather data API.
pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov/api/data";

/// Which of the two fixed source lists a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceGroup {
    Core,
    Supplementary,
}

/// Class of a source, which selects its default parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceClass {
    /// Short-horizon observations and terminal forecasts.
    PrimaryReport,
    /// Hazard advisories and pilot reports.
    HazardAdvisory,
    /// Forecast discussion narratives.
    DiscussionNarrative,
    /// Station metadata.
    StationMetadata,
    /// No defaults; caller parameters are passed through untouched.
    Passthrough,
}

impl SourceClass {
    /// Lookback window in hours applied when the caller supplies none.
    pub fn default_hours(&self) -> Option<u64> {
        match self {
            SourceClass::PrimaryReport => Some(2),
            SourceClass::HazardAdvisory => Some(4),
            SourceClass::DiscussionNarrative => Some(6),
            SourceClass::StationMetadata | SourceClass::Passthrough => None,
        }
    }

    /// Default parameter table for this class, in insertion order.
    pub fn default_params(&self) -> Vec<(&'static str, Value)> {
        if *self == SourceClass::Passthrough {
            return Vec::new();
        }

        let mut defaults = vec![("format", json!("json"))];
        if let Some(hours) = self.default_hours() {
            defaults.push(("hours", json!(hours)));
        }
        defaults
    }
}

impl fmt::Display for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceClass::PrimaryReport => write!(f, "primary report"),
            SourceClass::HazardAdvisory => write!(f, "hazard advisory"),
            SourceClass::DiscussionNarrative => write!(f, "discussion"),
            SourceClass::StationMetadata => write!(f, "station metadata"),
            SourceClass::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// One upstream data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub endpoint: String,
    pub group: SourceGroup,
    pub class: SourceClass,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        group: SourceGroup,
        class: SourceClass,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            group,
            class,
        }
    }
}

/// Core report endpoints.
const CORE_SOURCES: &[(&str, SourceClass)] = &[
    ("metar", SourceClass::PrimaryReport),
    ("taf", SourceClass::PrimaryReport),
    ("pirep", SourceClass::HazardAdvisory),
    ("sigmet", SourceClass::HazardAdvisory),
    ("afd", SourceClass::DiscussionNarrative),
    ("stationinfo", SourceClass::StationMetadata),
];

/// Additional endpoints fetched for a fuller picture.
const SUPPLEMENTARY_SOURCES: &[(&str, SourceClass)] = &[
    ("current", SourceClass::PrimaryReport),
    ("forecast", SourceClass::DiscussionNarrative),
    ("notam", SourceClass::Passthrough),
    ("airmet", SourceClass::HazardAdvisory),
    ("gairmet", SourceClass::HazardAdvisory),
    ("winds", SourceClass::Passthrough),
    ("icing", SourceClass::HazardAdvisory),
    ("turbulence", SourceClass::HazardAdvisory),
];

/// Immutable set of sources, split into core and supplementary lists.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    core: Vec<Source>,
    supplementary: Vec<Source>,
}

impl SourceRegistry {
    /// Build a registry from explicit lists.
    ///
    /// Source names must be unique across both lists, since each name keys
    /// exactly one entry of an aggregation result.
    pub fn new(core: Vec<Source>, supplementary: Vec<Source>) -> Result<Self> {
        let mut seen = HashSet::new();
        for source in core.iter().chain(supplementary.iter()) {
            ensure!(
                seen.insert(source.name.as_str()),
                "duplicate source name '{}' in registry",
                source.name
            );
        }

        Ok(Self {
            core,
            supplementary,
        })
    }

    /// The standard registry rooted at `base_url`.
    pub fn standard(base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let build = |table: &[(&str, SourceClass)], group: SourceGroup| -> Vec<Source> {
            table
                .iter()
                .map(|(name, class)| Source::new(*name, format!("{}/{}", base, name), group, *class))
                .collect()
        };

        Self::new(
            build(CORE_SOURCES, SourceGroup::Core),
            build(SUPPLEMENTARY_SOURCES, SourceGroup::Supplementary),
        )
    }

    pub fn core(&self) -> &[Source] {
        &self.core
    }

    pub fn supplementary(&self) -> &[Source] {
        &self.supplementary
    }

    /// All sources, core first.
    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.core.iter().chain(self.supplementary.iter())
    }

    pub fn len(&self) -> usize {
        self.core.len() + self.supplementary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a source by name.
    pub fn get(&self, name: &str) -> Option<&Source> {
        self.iter().find(|s| s.name == name)
    }

    /// Returns true if `name` is a registered source.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
