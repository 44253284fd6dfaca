//! HTTP clients for the external services the planner consults.

pub mod config;
pub mod currency;
pub mod flights;
pub mod gemini;
pub mod places;
pub mod routing;
pub mod search;
pub mod weather;

use std::sync::Arc;

use anyhow::Result;
use dreamtrip_core::{
    CollaboratorError, CurrencyRate, FlightPrices, GenerativeInference, PlaceLookup,
    RouteDuration, TextSearch, WeatherForecast,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use config::IntegrationConfig;
pub use currency::CurrencyLayerClient;
pub use flights::SimulatedFlights;
pub use gemini::GeminiClient;
pub use places::PlacesClient;
pub use routing::OpenRouteServiceClient;
pub use search::CustomSearchClient;
pub use weather::OpenWeatherClient;

/// Every collaborator the planning stages need, behind trait objects so
/// tests can swap any of them.
#[derive(Clone)]
pub struct Collaborators {
    pub inference: Arc<dyn GenerativeInference>,
    pub search: Arc<dyn TextSearch>,
    pub places: Arc<dyn PlaceLookup>,
    pub weather: Arc<dyn WeatherForecast>,
    pub currency: Arc<dyn CurrencyRate>,
    pub routes: Arc<dyn RouteDuration>,
    pub flights: Arc<dyn FlightPrices>,
    pub capabilities: Capabilities,
}

/// Which collaborators have credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub inference: bool,
    pub search: bool,
    pub places: bool,
    pub weather: bool,
    pub currency: bool,
    pub routing: bool,
}

impl Capabilities {
    pub fn from_config(config: &IntegrationConfig) -> Self {
        Self {
            inference: config.gemini_api_key.is_some(),
            search: config.search_api_key.is_some() && config.search_engine_id.is_some(),
            places: config.places_api_key.is_some(),
            weather: config.weather_api_key.is_some(),
            currency: config.currency_api_key.is_some(),
            routing: config.routing_api_key.is_some(),
        }
    }
}

impl Collaborators {
    pub fn from_config(config: &IntegrationConfig) -> Result<Self> {
        let http = config.build_http_client()?;
        Ok(Self {
            inference: Arc::new(GeminiClient::new(
                http.clone(),
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            )),
            search: Arc::new(CustomSearchClient::new(
                http.clone(),
                config.search_api_key.clone(),
                config.search_engine_id.clone(),
            )),
            places: Arc::new(PlacesClient::new(http.clone(), config.places_api_key.clone())),
            weather: Arc::new(OpenWeatherClient::new(
                http.clone(),
                config.weather_api_key.clone(),
            )),
            currency: Arc::new(CurrencyLayerClient::new(
                http.clone(),
                config.currency_api_key.clone(),
            )),
            routes: Arc::new(OpenRouteServiceClient::new(
                http,
                config.routing_api_key.clone(),
            )),
            flights: Arc::new(SimulatedFlights),
            capabilities: Capabilities::from_config(config),
        })
    }
}

pub(crate) fn network_error(err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Network(err.to_string())
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, CollaboratorError> {
    let status = response.status();
    if !status.is_success() {
        return Err(CollaboratorError::Status {
            service,
            status: status.as_u16(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| CollaboratorError::InvalidResponse(format!("{service}: {err}")))
}
