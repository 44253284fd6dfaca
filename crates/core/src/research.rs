use serde::Deserialize;

use crate::models::{EstimatedCost, FindingItem, QueryResults, SearchHit, TripParameters};
use crate::shape::{ShapeError, ValidatedShape};

/// Search queries proposed by inference.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SearchQueries(pub Vec<String>);

impl ValidatedShape for SearchQueries {
    fn validate(self) -> Result<Self, ShapeError> {
        let queries = self
            .0
            .into_iter()
            .map(|query| query.trim().to_string())
            .filter(|query| !query.is_empty())
            .collect::<Vec<_>>();
        if queries.is_empty() {
            return Err(ShapeError::violation("no usable search queries"));
        }
        Ok(Self(queries))
    }
}

/// Activities, accommodations and dining synthesized from search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SynthesizedFindings {
    pub activities: Vec<FindingItem>,
    pub accommodations: Vec<FindingItem>,
    pub dining: Vec<FindingItem>,
}

impl ValidatedShape for SynthesizedFindings {
    fn validate(self) -> Result<Self, ShapeError> {
        let all = self
            .activities
            .iter()
            .chain(&self.accommodations)
            .chain(&self.dining);
        for item in all {
            if item.name.trim().is_empty() {
                return Err(ShapeError::violation("finding with an empty name"));
            }
        }
        Ok(self)
    }
}

pub fn template_queries(destination: &str) -> Vec<String> {
    vec![
        format!("things to do in {destination}"),
        format!("hotels in {destination}"),
        format!("restaurants in {destination}"),
    ]
}

pub fn synthetic_results(query: &str, destination: &str) -> QueryResults {
    QueryResults {
        query: query.to_string(),
        organic_results: vec![SearchHit {
            title: format!("Result for {query}"),
            link: None,
            snippet: Some(format!("Mock description for {query} in {destination}")),
        }],
    }
}

pub fn fallback_findings(destination: &str) -> SynthesizedFindings {
    SynthesizedFindings {
        activities: vec![item(
            "City Tour",
            &format!("Explore the highlights of {destination}"),
            "$50",
        )],
        accommodations: vec![item(
            "Central Hotel",
            "Comfortable stay in the city center",
            "$150/night",
        )],
        dining: vec![item("Local Cuisine", "Traditional dishes", "$30")],
    }
}

fn item(name: &str, description: &str, cost: &str) -> FindingItem {
    FindingItem {
        name: name.to_string(),
        description: description.to_string(),
        estimated_cost: EstimatedCost::Text(cost.to_string()),
    }
}

pub fn query_prompt(params: &TripParameters, limit: usize) -> String {
    format!(
        "Generate {limit} specific web search queries to plan a trip to {} for {} days.\n\
         Interests: {}\n\
         Travel Style: {}\n\
         Budget: {}\n\n\
         Return only the queries as a JSON list of strings.",
        params.destination,
        params.duration_days,
        params.preferences.interests.join(", "),
        params.preferences.travel_style.as_deref().unwrap_or("unspecified"),
        params.preferences.budget_range.as_deref().unwrap_or("unspecified"),
    )
}

pub fn synthesis_prompt(params: &TripParameters, results: &[QueryResults]) -> String {
    let results_json = serde_json::to_string(results).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Synthesize the following search results into a structured list of potential activities, \
         accommodations, and dining options for a trip to {}.\n\n\
         Search Results:\n{results_json}\n\n\
         Return a JSON object with keys: 'activities', 'accommodations', 'dining'.\n\
         Each should be a list of items with 'name', 'description', 'estimated_cost'.",
        params.destination
    )
}
