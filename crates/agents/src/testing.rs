//! Scripted collaborators for stage tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dreamtrip_core::{
    CollaboratorError, Coordinates, CurrencyRate, GenerativeInference, PlaceLookup, PlaceRecord,
    RouteDuration, SearchHit, TextSearch, WeatherForecast, WeatherReport,
};
use dreamtrip_integrations::{Capabilities, Collaborators, SimulatedFlights};

/// Replies with the first script entry whose key appears in the prompt.
/// Unmatched prompts fail as if inference were unconfigured.
#[derive(Default)]
pub(crate) struct ScriptedInference {
    replies: Vec<(&'static str, String)>,
}

impl ScriptedInference {
    pub(crate) fn reply(mut self, prompt_key: &'static str, reply: impl Into<String>) -> Self {
        self.replies.push((prompt_key, reply.into()));
        self
    }
}

#[async_trait]
impl GenerativeInference for ScriptedInference {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.replies
            .iter()
            .find(|(key, _)| prompt.contains(key))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| CollaboratorError::unconfigured("inference"))
    }
}

#[derive(Default)]
pub(crate) struct StubSearch {
    pub(crate) configured: bool,
    pub(crate) failing_query: Option<&'static str>,
    pub(crate) calls: AtomicUsize,
}

#[async_trait]
impl TextSearch for StubSearch {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_query == Some(query) {
            return Err(CollaboratorError::Network("connection reset".to_string()));
        }
        Ok((0..limit)
            .map(|idx| SearchHit {
                title: format!("{query} #{idx}"),
                link: None,
                snippet: None,
            })
            .collect())
    }
}

/// Place results keyed by lowercase query.
#[derive(Default)]
pub(crate) struct StubPlaces {
    places: HashMap<String, Vec<PlaceRecord>>,
}

impl StubPlaces {
    pub(crate) fn with(mut self, query: &str, names: &[&str]) -> Self {
        let records = names
            .iter()
            .enumerate()
            .map(|(idx, name)| PlaceRecord {
                name: name.to_string(),
                address: None,
                rating: Some(4.0),
                lat: Some(35.0 + idx as f64),
                lng: Some(139.0),
            })
            .collect();
        self.places.insert(query.to_lowercase(), records);
        self
    }
}

#[async_trait]
impl PlaceLookup for StubPlaces {
    async fn find(&self, query: &str) -> Result<Vec<PlaceRecord>, CollaboratorError> {
        Ok(self
            .places
            .get(&query.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

pub(crate) struct StubWeather;

#[async_trait]
impl WeatherForecast for StubWeather {
    async fn forecast(&self, _city: &str) -> WeatherReport {
        WeatherReport::unavailable()
    }
}

pub(crate) struct StubRate(pub(crate) Option<f64>);

#[async_trait]
impl CurrencyRate for StubRate {
    async fn usd_rate(&self, _target: &str) -> Result<Option<f64>, CollaboratorError> {
        match self.0 {
            Some(rate) => Ok(Some(rate)),
            None => Err(CollaboratorError::unconfigured("currency")),
        }
    }
}

pub(crate) struct StubRoutes(pub(crate) f64);

#[async_trait]
impl RouteDuration for StubRoutes {
    async fn duration_seconds(
        &self,
        _from: Coordinates,
        _to: Coordinates,
    ) -> Result<Option<f64>, CollaboratorError> {
        Ok(Some(self.0))
    }
}

/// No credentials anywhere; flights still quote.
pub(crate) fn offline() -> Collaborators {
    Collaborators {
        inference: Arc::new(ScriptedInference::default()),
        search: Arc::new(StubSearch::default()),
        places: Arc::new(StubPlaces::default()),
        weather: Arc::new(StubWeather),
        currency: Arc::new(StubRate(None)),
        routes: Arc::new(StubRoutes(600.0)),
        flights: Arc::new(SimulatedFlights),
        capabilities: Capabilities::default(),
    }
}
