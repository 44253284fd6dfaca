//! Contracts for the external services the planning stages consult.
//!
//! Every call may fail. Stages treat an `Err` the same way as an empty
//! result: the data is omitted or the stage falls back.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Coordinates, FlightOption, PlaceRecord, SearchHit, WeatherReport};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{service} is not configured")]
    Unconfigured { service: &'static str },

    #[error("network error: {0}")]
    Network(String),

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CollaboratorError {
    pub fn unconfigured(service: &'static str) -> Self {
        Self::Unconfigured { service }
    }

    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Unconfigured { .. })
    }
}

#[async_trait]
pub trait GenerativeInference: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait TextSearch: Send + Sync {
    /// Whether credentials are present. Without them the research stage
    /// substitutes synthetic results rather than calling `search`.
    fn is_configured(&self) -> bool;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, CollaboratorError>;
}

#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn find(&self, query: &str) -> Result<Vec<PlaceRecord>, CollaboratorError>;
}

#[async_trait]
pub trait WeatherForecast: Send + Sync {
    /// The report's status carries failures; this call never errors.
    async fn forecast(&self, city: &str) -> WeatherReport;
}

#[async_trait]
pub trait CurrencyRate: Send + Sync {
    /// USD to `target` multiplier, `None` when the provider has no quote.
    async fn usd_rate(&self, target: &str) -> Result<Option<f64>, CollaboratorError>;
}

#[async_trait]
pub trait RouteDuration: Send + Sync {
    async fn duration_seconds(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<Option<f64>, CollaboratorError>;
}

#[async_trait]
pub trait FlightPrices: Send + Sync {
    /// Options sorted ascending by price.
    async fn quote(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<FlightOption>, CollaboratorError>;
}
