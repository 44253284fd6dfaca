use async_trait::async_trait;
use dreamtrip_core::{CollaboratorError, Coordinates, RouteDuration};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{network_error, read_json};

const SERVICE: &str = "openrouteservice";
const ENDPOINT: &str = "https://api.openrouteservice.org/v2/directions/driving-car";

pub struct OpenRouteServiceClient {
    http: Client,
    api_key: Option<String>,
}

impl OpenRouteServiceClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Option<FeatureProperties>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    duration: f64,
}

fn first_segment_seconds(body: DirectionsResponse) -> Option<f64> {
    body.features
        .into_iter()
        .next()?
        .properties?
        .segments
        .first()
        .map(|segment| segment.duration)
}

// the API takes "lng,lat"
fn lng_lat(point: Coordinates) -> String {
    format!("{},{}", point.lng, point.lat)
}

#[async_trait]
impl RouteDuration for OpenRouteServiceClient {
    #[instrument(skip(self))]
    async fn duration_seconds(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<Option<f64>, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::unconfigured(SERVICE))?;

        let response = self
            .http
            .get(ENDPOINT)
            .query(&[
                ("api_key", api_key.to_string()),
                ("start", lng_lat(from)),
                ("end", lng_lat(to)),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let body: DirectionsResponse = read_json(SERVICE, response).await?;
        Ok(first_segment_seconds(body))
    }
}
