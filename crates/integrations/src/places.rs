use async_trait::async_trait;
use dreamtrip_core::{CollaboratorError, PlaceLookup, PlaceRecord};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{network_error, read_json};

const SERVICE: &str = "places";
const ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";

pub struct PlacesClient {
    http: Client,
    api_key: Option<String>,
}

impl PlacesClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: Option<String>,
    formatted_address: Option<String>,
    rating: Option<f64>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl PlaceResult {
    fn into_record(self) -> Option<PlaceRecord> {
        let location = self.geometry.and_then(|geometry| geometry.location);
        Some(PlaceRecord {
            name: self.name.filter(|name| !name.trim().is_empty())?,
            address: self.formatted_address,
            rating: self.rating,
            lat: location.as_ref().and_then(|loc| loc.lat),
            lng: location.as_ref().and_then(|loc| loc.lng),
        })
    }
}

#[async_trait]
impl PlaceLookup for PlacesClient {
    #[instrument(skip(self))]
    async fn find(&self, query: &str) -> Result<Vec<PlaceRecord>, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::unconfigured(SERVICE))?;

        let response = self
            .http
            .get(ENDPOINT)
            .query(&[("query", query), ("key", api_key)])
            .send()
            .await
            .map_err(network_error)?;

        let body: TextSearchResponse = read_json(SERVICE, response).await?;
        Ok(map_results(body))
    }
}

fn map_results(body: TextSearchResponse) -> Vec<PlaceRecord> {
    body.results
        .into_iter()
        .filter_map(PlaceResult::into_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_text_search_results_in_order() {
        let body: TextSearchResponse = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "results": [
                {
                    "name": "Senso-ji",
                    "formatted_address": "2 Chome-3-1 Asakusa, Taito City, Tokyo",
                    "rating": 4.5,
                    "geometry": { "location": { "lat": 35.7148, "lng": 139.7967 } }
                },
                { "name": "Nameless Alley" },
                { "formatted_address": "no name" }
            ]
        }))
        .unwrap();

        let records = map_results(body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Senso-ji");
        assert_eq!(records[0].rating, Some(4.5));
        assert!(records[0].coordinates().is_some());
        assert_eq!(records[1].coordinates(), None);
    }
}
