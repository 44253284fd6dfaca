use serde::{Deserialize, Serialize};

/// Limits and thresholds for the planning stages, injected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub max_search_queries: usize,
    pub search_results_per_query: usize,
    pub query_cache_capacity: usize,
    pub interest_limit: usize,
    pub places_per_interest: usize,
    pub top_places_limit: usize,
    pub flight_options_limit: usize,
    /// Alternative scenarios are offered once the estimate exceeds the
    /// stated budget by this factor.
    pub alternative_threshold: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_search_queries: 5,
            search_results_per_query: 3,
            query_cache_capacity: 32,
            interest_limit: 3,
            places_per_interest: 3,
            top_places_limit: 10,
            flight_options_limit: 3,
            alternative_threshold: 1.5,
        }
    }
}
