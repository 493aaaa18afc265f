//! Discovery Engine (spec.md §4.6, component C6): wires schema enumeration,
//! attribute profiling, relationship mining, and quality scoring onto the
//! Backend + cache + resilience stack, bounded by `max_discovery_workers`
//! concurrent sub-queries and tracked through a [`DiscoveryJobTracker`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use ogw_backend::{GraphQlRequest, ResilientBackend};
use ogw_cache::Cache;
use ogw_domain::config::DiscoveryConfig;
use ogw_domain::error::{Error, Result};

use crate::attribute::profile_attribute;
use crate::job::DiscoveryJobTracker;
use crate::model::{AttributeProfile, DiscoveredSchema, PartialResult, QualityReport, RelationshipEdge};
use crate::quality::score_quality;
use crate::relationship::{candidate_attributes, join_coverage_query, parse_join_coverage};
use crate::schema::{enumeration_query, parse_enumeration};

const TOOL_CLASS: &str = "discovery";

pub struct DiscoveryEngine {
    backend: Arc<ResilientBackend>,
    cache: Arc<Cache>,
    config: DiscoveryConfig,
    account_id: String,
    jobs: Arc<DiscoveryJobTracker>,
    semaphore: Arc<Semaphore>,
}

impl DiscoveryEngine {
    pub fn new(backend: Arc<ResilientBackend>, cache: Arc<Cache>, config: DiscoveryConfig, account_id: impl Into<String>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_discovery_workers));
        Self { backend, cache, config, account_id: account_id.into(), jobs: DiscoveryJobTracker::new(), semaphore }
    }

    pub fn jobs(&self) -> &Arc<DiscoveryJobTracker> {
        &self.jobs
    }

    /// Schema discovery (spec.md §4.6): a single broad enumeration query,
    /// cached under `schema_ttl_secs`.
    pub async fn discover_schemas(&self, window: &str, deadline: Duration) -> Result<Vec<DiscoveredSchema>> {
        let job = self.jobs.start("schema_discovery");
        let cache_key = format!("discovery:schemas|{}|{}", self.account_id, window);
        let ttl = Duration::from_secs(self.config.schema_ttl_secs);

        let backend = self.backend.clone();
        let account_id = self.account_id.clone();
        let window_owned = window.to_string();
        let min_count = self.config.min_schema_observation_count;

        let _permit = self.semaphore.acquire().await.map_err(|e| Error::Internal(e.to_string()))?;

        let result = self
            .cache
            .get_or_fetch(&cache_key, Some(ttl), move || async move {
                let request = GraphQlRequest::new(enumeration_query(), json!({ "window": window_owned }), account_id);
                let response = backend.call(TOOL_CLASS, request, deadline).await?;
                if response.has_errors() {
                    let messages: Vec<String> = response.errors.iter().map(|e| e.message.clone()).collect();
                    return Err(Error::Backend { message: messages.join("; ") });
                }
                let data = response.data.unwrap_or(Value::Null);
                parse_enumeration(&data, min_count).map_err(Error::Internal)
            })
            .await;

        match result {
            Ok(schemas) => {
                job.complete();
                Ok(schemas)
            }
            Err(err) => {
                job.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Attribute profiling (spec.md §4.6): samples up to `sample_size`
    /// events for `schema` and profiles every attribute key observed across
    /// them, cached under `attribute_ttl_secs`.
    pub async fn profile_attributes(&self, schema: &str, window: &str, deadline: Duration) -> Result<Vec<AttributeProfile>> {
        let job = self.jobs.start("attribute_profiling");
        let cache_key = format!("discovery:attributes|{}|{}|{}", self.account_id, schema, window);
        let ttl = Duration::from_secs(self.config.attribute_ttl_secs);

        let _permit = self.semaphore.acquire().await.map_err(|e| Error::Internal(e.to_string()))?;

        let samples = match self.fetch_samples(schema, window, deadline).await {
            Ok(samples) => samples,
            Err(err) => {
                job.fail(err.to_string());
                return Err(err);
            }
        };

        let result: Result<Vec<AttributeProfile>> = self
            .cache
            .get_or_fetch(&cache_key, Some(ttl), move || async move {
                let total = samples.len();
                let mut names: Vec<String> = Vec::new();
                for sample in &samples {
                    if let Some(obj) = sample.as_object() {
                        for key in obj.keys() {
                            if !names.iter().any(|n| n == key) {
                                names.push(key.clone());
                            }
                        }
                    }
                }
                Ok(names.into_iter().map(|name| profile_attribute(&name, &samples, total)).collect())
            })
            .await;

        match result {
            Ok(profiles) => {
                job.complete();
                Ok(profiles)
            }
            Err(err) => {
                job.fail(err.to_string());
                Err(err)
            }
        }
    }

    async fn fetch_samples(&self, schema: &str, window: &str, deadline: Duration) -> Result<Vec<Value>> {
        let query = "query AttributeSamples($schema: String!, $window: TimeWindow!, $limit: Int!) { \
            samples(schema: $schema, window: $window, limit: $limit) }";
        let request = GraphQlRequest::new(
            query,
            json!({ "schema": schema, "window": window, "limit": self.config.sample_size }),
            self.account_id.clone(),
        );
        let response = self.backend.call(TOOL_CLASS, request, deadline).await?;
        if response.has_errors() {
            let messages: Vec<String> = response.errors.iter().map(|e| e.message.clone()).collect();
            return Err(Error::Backend { message: messages.join("; ") });
        }
        match response.data.and_then(|d| d.get("samples").cloned()) {
            Some(Value::Array(items)) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Relationship mining (spec.md §4.6): one join-coverage query per
    /// candidate attribute shared between each schema pair, run concurrently
    /// and bounded by `max_discovery_workers`. A per-pair failure is
    /// recorded as a failed sub-query rather than aborting the whole
    /// operation (spec.md §4.6 partial-failure contract).
    pub async fn mine_relationships(
        &self,
        profiles_by_schema: &HashMap<String, Vec<AttributeProfile>>,
        window: &str,
        deadline: Duration,
    ) -> PartialResult<RelationshipEdge> {
        let job = self.jobs.start("relationship_mining");
        let schemas: Vec<&String> = profiles_by_schema.keys().collect();
        let min_confidence = self.config.min_relationship_confidence;

        let mut tasks = Vec::new();
        for (i, source) in schemas.iter().enumerate() {
            for target in schemas.iter().skip(i + 1) {
                let shared = candidate_attributes(&profiles_by_schema[*source], &profiles_by_schema[*target]);
                for attribute in shared {
                    let source = (*source).clone();
                    let target = (*target).clone();
                    let window = window.to_string();
                    tasks.push(async move {
                        let _permit = self.semaphore.acquire().await;
                        let request = GraphQlRequest::new(
                            join_coverage_query(),
                            json!({ "source": source, "target": target, "attribute": attribute, "window": window }),
                            self.account_id.clone(),
                        );
                        let sub_query_label = format!("{source}.{attribute}->{target}");
                        let outcome = self.backend.call(TOOL_CLASS, request, deadline).await;
                        match outcome {
                            Ok(response) if !response.has_errors() => {
                                let data = response.data.unwrap_or(Value::Null);
                                match parse_join_coverage(&data, &source, &target, &attribute, min_confidence) {
                                    Ok(edge) => Ok(edge),
                                    Err(e) => Err((sub_query_label, e)),
                                }
                            }
                            Ok(response) => {
                                let messages: Vec<String> = response.errors.iter().map(|e| e.message.clone()).collect();
                                Err((sub_query_label, messages.join("; ")))
                            }
                            Err(e) => Err((sub_query_label, e.to_string())),
                        }
                    });
                }
            }
        }

        let results = join_all(tasks).await;
        let mut edges = Vec::new();
        let mut failed_sub_queries = Vec::new();
        for result in results {
            match result {
                Ok(Some(edge)) => edges.push(edge),
                Ok(None) => {}
                Err((label, _)) => failed_sub_queries.push(label),
            }
        }

        let partial = !failed_sub_queries.is_empty();
        if partial {
            job.partial(&failed_sub_queries);
        } else {
            job.complete();
        }

        PartialResult { items: edges, partial, failed_sub_queries }
    }

    /// Quality scoring (spec.md §4.6): profiles `schema`'s attributes (or
    /// reuses already-profiled ones) and combines them with the schema's
    /// most recent observation timestamp, cached under `quality_ttl_secs`.
    pub async fn score_quality(&self, schema: &str, window: &str, now: DateTime<Utc>, deadline: Duration) -> Result<QualityReport> {
        let job = self.jobs.start("quality_scoring");
        let cache_key = format!("discovery:quality|{}|{}|{}", self.account_id, schema, window);
        let ttl = Duration::from_secs(self.config.quality_ttl_secs);

        let attributes = match self.profile_attributes(schema, window, deadline).await {
            Ok(attrs) => attrs,
            Err(err) => {
                job.fail(err.to_string());
                return Err(err);
            }
        };
        let most_recent = most_recent_timestamp(&attributes);
        let schema_owned = schema.to_string();

        let result = self
            .cache
            .get_or_fetch(&cache_key, Some(ttl), move || async move { Ok(score_quality(&schema_owned, &attributes, most_recent, now)) })
            .await;

        match result {
            Ok(report) => {
                job.complete();
                Ok(report)
            }
            Err(err) => {
                job.fail(err.to_string());
                Err(err)
            }
        }
    }
}

/// The latest timestamp across any attribute's sample values, used as the
/// freshness anchor (spec.md §4.6: "recency of the most recent observation").
fn most_recent_timestamp(attributes: &[AttributeProfile]) -> Option<DateTime<Utc>> {
    attributes
        .iter()
        .filter(|a| matches!(a.inferred_type, crate::model::AttributeType::Timestamp))
        .flat_map(|a| a.sample_values.iter())
        .filter_map(|v| v.as_str())
        .filter_map(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogw_backend::MockBackend;
    use ogw_domain::config::{CacheBackendKind, CacheConfig, CircuitBreakerConfig, RateLimitConfig, RetryConfig};

    fn engine(mock: Arc<MockBackend>) -> DiscoveryEngine {
        let backend = Arc::new(ResilientBackend::new(
            mock,
            CircuitBreakerConfig { failure_threshold: 5, cooldown_secs: 30 },
            RateLimitConfig { global_requests_per_second: 1000.0, global_burst: 1000.0, per_class: Default::default() },
            RetryConfig { max_retries: 0, base_delay_ms: 1, multiplier: 2.0, jitter_ratio: 0.0 },
        ));
        let cache = Arc::new(Cache::new(
            &CacheConfig { backend: CacheBackendKind::InProcess, max_entries: 100, max_bytes: 1_000_000, default_ttl_secs: 60 },
            None,
        ));
        DiscoveryEngine::new(backend, cache, DiscoveryConfig::default(), "acct-1")
    }

    #[tokio::test]
    async fn discover_schemas_filters_and_completes_job() {
        let mock = Arc::new(MockBackend::new(json!({
            "schemas": [{"name": "Transaction", "count": 500}, {"name": "Empty", "count": 0}]
        })));
        let eng = engine(mock);
        let schemas = eng.discover_schemas("1 DAY AGO", Duration::from_secs(5)).await.unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "Transaction");
    }

    #[tokio::test]
    async fn profile_attributes_covers_every_observed_key() {
        let mock = Arc::new(MockBackend::new(json!({
            "samples": [{"duration": 1.5, "error": false}, {"duration": 2.0, "error": true}]
        })));
        let eng = engine(mock);
        let profiles = eng.profile_attributes("Transaction", "1 DAY AGO", Duration::from_secs(5)).await.unwrap();
        let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"duration"));
        assert!(names.contains(&"error"));
    }

    #[tokio::test]
    async fn mine_relationships_reports_partial_on_sub_query_failure() {
        use ogw_backend::mock::Scripted;
        let mock = Arc::new(MockBackend::new(json!({"joinCoverage": {"matchedRows": 90, "totalRows": 100}})));
        mock.push(Scripted::Network);
        let eng = engine(mock);

        let mut profiles = HashMap::new();
        profiles.insert("A".to_string(), vec![AttributeProfile {
            name: "id".into(),
            inferred_type: crate::model::AttributeType::String,
            cardinality_estimate: 10,
            null_ratio: 0.0,
            coverage_ratio: 1.0,
            sample_count: 100,
            sample_values: Vec::new(),
        }]);
        profiles.insert("B".to_string(), vec![AttributeProfile {
            name: "id".into(),
            inferred_type: crate::model::AttributeType::String,
            cardinality_estimate: 10,
            null_ratio: 0.0,
            coverage_ratio: 1.0,
            sample_count: 100,
            sample_values: Vec::new(),
        }]);

        let result = eng.mine_relationships(&profiles, "1 DAY AGO", Duration::from_secs(5)).await;
        assert!(result.partial);
        assert_eq!(result.failed_sub_queries.len(), 1);
    }
}
