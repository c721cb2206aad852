//! Upstream data sources: registry, parameter building and fetching.

pub mod fetcher;
pub mod params;
pub mod registry;

pub use fetcher::{FetcherConfig, SourceFetcher};
pub use params::params_for;
pub use registry::{Source, SourceRegistry};
