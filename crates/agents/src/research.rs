use std::num::NonZeroUsize;
use std::sync::Arc;

use dreamtrip_core::research::{
    fallback_findings, query_prompt, synthesis_prompt, synthetic_results, template_queries,
    SearchQueries, SynthesizedFindings,
};
use dreamtrip_core::{Findings, PlaceRecord, QueryResults, SearchHit, TripParameters};
use dreamtrip_integrations::Collaborators;
use dreamtrip_observability::AppMetrics;
use futures::future::join_all;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{infer, note_failure, PlannerConfig};

/// Search results keyed by exact query string, bounded to `capacity` entries
/// with least-recently-used eviction. A zero capacity disables caching.
pub struct QueryCache {
    inner: Option<Mutex<LruCache<String, Vec<SearchHit>>>>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let inner = NonZeroUsize::new(capacity).map(|capacity| Mutex::new(LruCache::new(capacity)));
        Self { inner }
    }

    pub fn get(&self, query: &str) -> Option<Vec<SearchHit>> {
        self.inner.as_ref()?.lock().get(query).cloned()
    }

    pub fn insert(&self, query: &str, hits: Vec<SearchHit>) {
        if let Some(inner) = &self.inner {
            inner.lock().put(query.to_string(), hits);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Research for one request. The query cache lives as long as the stage, so
/// a new stage is built per plan.
pub struct ResearchStage {
    collaborators: Collaborators,
    config: PlannerConfig,
    metrics: Arc<AppMetrics>,
    cache: QueryCache,
}

impl ResearchStage {
    pub fn new(
        collaborators: Collaborators,
        config: PlannerConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let cache = QueryCache::new(config.query_cache_capacity);
        Self {
            collaborators,
            config,
            metrics,
            cache,
        }
    }

    #[instrument(skip_all, fields(destination = %params.destination))]
    pub async fn run(&self, params: &TripParameters) -> Findings {
        let queries = self.queries(params).await;
        let results = self.search_all(&queries, &params.destination).await;
        let synthesized = self.synthesize(params, &results).await;

        let (weather, top_places) = futures::join!(
            self.collaborators.weather.forecast(&params.destination),
            self.top_places(params),
        );

        info!(
            queries = queries.len(),
            result_sets = results.len(),
            top_places = top_places.len(),
            weather = ?weather.status,
            "research complete"
        );

        Findings {
            activities: synthesized.activities,
            accommodations: synthesized.accommodations,
            dining: synthesized.dining,
            weather,
            top_places,
        }
    }

    async fn queries(&self, params: &TripParameters) -> Vec<String> {
        let prompt = query_prompt(params, self.config.max_search_queries);
        let inference = self.collaborators.inference.as_ref();
        match infer::<SearchQueries>(inference, &self.metrics, &prompt).await {
            Ok(SearchQueries(mut queries)) => {
                queries.truncate(self.config.max_search_queries);
                queries
            }
            Err(err) => {
                warn!(
                    stage = "research_queries",
                    reason = err.reason(),
                    error = %err,
                    "using template queries"
                );
                self.metrics.inc_stage_fallback("research_queries");
                template_queries(&params.destination)
            }
        }
    }

    /// One result set per query, in query order. A query whose search fails
    /// is left out.
    async fn search_all(&self, queries: &[String], destination: &str) -> Vec<QueryResults> {
        if !self.collaborators.search.is_configured() {
            debug!("search credentials missing, using synthetic results");
            return queries
                .iter()
                .map(|query| synthetic_results(query, destination))
                .collect();
        }

        join_all(queries.iter().map(|query| self.search_one(query)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn search_one(&self, query: &str) -> Option<QueryResults> {
        if let Some(hits) = self.cache.get(query) {
            return Some(QueryResults {
                query: query.to_string(),
                organic_results: hits,
            });
        }

        match self
            .collaborators
            .search
            .search(query, self.config.search_results_per_query)
            .await
        {
            Ok(hits) => {
                self.cache.insert(query, hits.clone());
                Some(QueryResults {
                    query: query.to_string(),
                    organic_results: hits,
                })
            }
            Err(err) => {
                note_failure(&self.metrics, "search", &err);
                warn!(query = %query, error = %err, "search failed");
                None
            }
        }
    }

    async fn synthesize(
        &self,
        params: &TripParameters,
        results: &[QueryResults],
    ) -> SynthesizedFindings {
        let prompt = synthesis_prompt(params, results);
        let inference = self.collaborators.inference.as_ref();
        match infer::<SynthesizedFindings>(inference, &self.metrics, &prompt).await {
            Ok(findings) => findings,
            Err(err) => {
                warn!(
                    stage = "research_synthesis",
                    reason = err.reason(),
                    error = %err,
                    "using canned findings"
                );
                self.metrics.inc_stage_fallback("research_synthesis");
                fallback_findings(&params.destination)
            }
        }
    }

    async fn top_places(&self, params: &TripParameters) -> Vec<PlaceRecord> {
        let lookups = params
            .preferences
            .interests
            .iter()
            .take(self.config.interest_limit)
            .map(|interest| {
                let query = format!("{interest} in {}", params.destination);
                async move {
                    match self.collaborators.places.find(&query).await {
                        Ok(places) => places,
                        Err(err) => {
                            note_failure(&self.metrics, "places", &err);
                            debug!(query = %query, error = %err, "place lookup omitted");
                            Vec::new()
                        }
                    }
                }
            });

        join_all(lookups)
            .await
            .into_iter()
            .flat_map(|places| places.into_iter().take(self.config.places_per_interest))
            .take(self.config.top_places_limit)
            .collect()
    }
}
