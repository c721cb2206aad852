//! Concurrent fan-out over every registered source.
//!
//! One future is built per source, all are joined, and only then are the
//! outcomes folded into the result. Each future owns its own keyed outcome,
//! so no shared accumulator is written concurrently.

use crate::models::{AggregationResult, FetchOutcome, ParamMap, Query};
use crate::sources::{params_for, Source, SourceFetcher, SourceRegistry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Resolved request for one source, without any I/O performed.
#[derive(Debug, Clone)]
pub struct PlannedFetch<'a> {
    pub source: &'a Source,
    pub params: ParamMap,
}

/// Runs the full-registry fan-out for a query.
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    fetcher: SourceFetcher,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>, fetcher: SourceFetcher) -> Self {
        Self { registry, fetcher }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Resolve parameters for every source, core list first.
    pub fn plan<'a>(&'a self, query: &Query) -> Vec<PlannedFetch<'a>> {
        self.registry
            .iter()
            .map(|source| PlannedFetch {
                source,
                params: params_for(source, query),
            })
            .collect()
    }

    /// Fetch every source concurrently and merge the outcomes.
    ///
    /// Always waits for all sources; a failing source only populates its
    /// own entry in `errors`.
    pub async fn aggregate(&self, query: &Query) -> AggregationResult {
        if self.registry.is_empty() {
            warn!("No sources registered");
            return AggregationResult::default();
        }
        for (key, value) in query {
            if value.is_object() && !self.registry.contains(key) {
                warn!("Ignoring overrides for unknown source '{}'", key);
            }
        }

        let start = Instant::now();
        info!(
            "Fetching {} sources ({} core, {} supplementary)",
            self.registry.len(),
            self.registry.core().len(),
            self.registry.supplementary().len()
        );

        let core = self.fan_out(self.registry.core(), query);
        let supplementary = self.fan_out(self.registry.supplementary(), query);
        let (core_outcomes, supplementary_outcomes) = futures::join!(core, supplementary);

        let mut result = AggregationResult::default();
        for (name, outcome) in core_outcomes.into_iter().chain(supplementary_outcomes) {
            result.record(name, outcome);
        }

        info!(
            "Aggregation finished in {:.1}s: {} ok, {} failed",
            start.elapsed().as_secs_f64(),
            result.data.len(),
            result.errors.len()
        );

        result
    }

    async fn fan_out(&self, sources: &[Source], query: &Query) -> Vec<(String, FetchOutcome)> {
        let fetches = sources.iter().map(|source| {
            let params = params_for(source, query);
            async move {
                let outcome = self.fetcher.fetch(source, &params).await;
                debug!(
                    "{} -> {}",
                    source.name,
                    if outcome.is_success() { "ok" } else { "failed" }
                );
                (source.name.clone(), outcome)
            }
        });

        join_all(fetches).await
    }
}

/// Sources that failed, sorted by name.
pub fn failed_sources(result: &AggregationResult) -> Vec<&str> {
    result.errors.keys().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;
    use crate::sources::registry::{SourceClass, SourceGroup};
    use crate::sources::FetcherConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn registry_at(
        base: &str,
        core: &[(&str, SourceClass)],
        extra: &[(&str, SourceClass)],
    ) -> SourceRegistry {
        let build = |table: &[(&str, SourceClass)], group: SourceGroup| -> Vec<Source> {
            table
                .iter()
                .map(|(name, class)| Source::new(*name, format!("{}/{}", base, name), group, *class))
                .collect()
        };
        SourceRegistry::new(
            build(core, SourceGroup::Core),
            build(extra, SourceGroup::Supplementary),
        )
        .unwrap()
    }

    fn aggregator(registry: SourceRegistry) -> Aggregator {
        let fetcher = SourceFetcher::new(FetcherConfig {
            timeout_seconds: 5,
            ..FetcherConfig::default()
        })
        .unwrap();
        Aggregator::new(Arc::new(registry), fetcher)
    }

    fn query(value: serde_json::Value) -> Query {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_every_source_classified_once() {
        let mut server = mockito::Server::new_async().await;
        let _a = server
            .mock("GET", "/metar")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/sigmet")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;
        let _c = server
            .mock("GET", "/afd")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("plain discussion text")
            .create_async()
            .await;
        // "winds" has no mock, so mockito answers 501.

        let registry = registry_at(
            &server.url(),
            &[
                ("metar", SourceClass::PrimaryReport),
                ("sigmet", SourceClass::HazardAdvisory),
            ],
            &[
                ("afd", SourceClass::DiscussionNarrative),
                ("winds", SourceClass::Passthrough),
            ],
        );
        let total = registry.len();
        let agg = aggregator(registry);

        let result = agg.aggregate(&Query::new()).await;

        assert_eq!(result.source_count(), total);
        for source in agg.registry().iter() {
            let in_data = result.data.contains_key(&source.name);
            let in_errors = result.errors.contains_key(&source.name);
            assert!(in_data ^ in_errors, "{} must be in exactly one map", source.name);
        }
        assert_eq!(result.data.get("metar"), Some(&Payload::Structured(json!([]))));
        assert!(result.data.get("afd").map(Payload::is_raw_text).unwrap_or(false));
        assert!(result.errors.contains_key("sigmet"));
        assert!(result.errors.contains_key("winds"));
        assert_eq!(failed_sources(&result), vec!["sigmet", "winds"]);
    }

    #[tokio::test]
    async fn test_failing_source_does_not_affect_others() {
        let mut server = mockito::Server::new_async().await;
        let _a = server
            .mock("GET", "/A")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;
        let b = server
            .mock("GET", "/B")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("hours".into(), "4".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"reports": 2}"#)
            .expect(1)
            .create_async()
            .await;

        let agg = aggregator(registry_at(
            &server.url(),
            &[
                ("A", SourceClass::PrimaryReport),
                ("B", SourceClass::HazardAdvisory),
            ],
            &[],
        ));

        let result = agg.aggregate(&query(json!({"A": {"hours": 5}}))).await;

        assert!(result.errors.get("A").unwrap().contains("503"));
        assert!(!result.data.contains_key("A"));
        assert_eq!(
            result.data.get("B"),
            Some(&Payload::Structured(json!({"reports": 2})))
        );
        b.assert_async().await;
    }

    #[tokio::test]
    async fn test_repeated_aggregation_is_stable() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/metar")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[1]")
            .expect(2)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/taf")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let agg = aggregator(registry_at(
            &server.url(),
            &[
                ("metar", SourceClass::PrimaryReport),
                ("taf", SourceClass::PrimaryReport),
            ],
            &[],
        ));
        let q = query(json!({"ids": "KJFK"}));

        let first = agg.aggregate(&q).await;
        let second = agg.aggregate(&q).await;

        assert_eq!(
            first.data.keys().collect::<Vec<_>>(),
            second.data.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            first.errors.keys().collect::<Vec<_>>(),
            second.errors.keys().collect::<Vec<_>>()
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_resolves_all_sources() {
        let agg = aggregator(registry_at(
            "http://localhost:1",
            &[
                ("A", SourceClass::PrimaryReport),
                ("B", SourceClass::HazardAdvisory),
            ],
            &[("C", SourceClass::Passthrough)],
        ));

        let plan = agg.plan(&query(json!({"A": {"hours": 5}, "ids": "KJFK"})));
        let names: Vec<&str> = plan.iter().map(|p| p.source.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        assert_eq!(plan[0].params.get("hours"), Some(&json!(5)));
        assert_eq!(plan[1].params.get("hours"), Some(&json!(4)));
        assert_eq!(
            serde_json::Value::Object(plan[2].params.clone()),
            json!({"ids": "KJFK"})
        );
    }

    #[tokio::test]
    async fn test_empty_registry_yields_empty_result() {
        let agg = aggregator(SourceRegistry::default());
        let result = agg.aggregate(&Query::new()).await;
        assert_eq!(result.source_count(), 0);
    }
}
