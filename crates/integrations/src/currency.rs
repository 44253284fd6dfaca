use std::collections::HashMap;

use async_trait::async_trait;
use dreamtrip_core::{CollaboratorError, CurrencyRate};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{network_error, read_json};

const SERVICE: &str = "currencylayer";
const ENDPOINT: &str = "http://api.currencylayer.com/live";

pub struct CurrencyLayerClient {
    http: Client,
    api_key: Option<String>,
}

impl CurrencyLayerClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    #[serde(default)]
    quotes: HashMap<String, serde_json::Value>,
}

fn usd_quote(body: &LiveResponse, target: &str) -> Option<f64> {
    body.quotes
        .get(&format!("USD{}", target.to_ascii_uppercase()))
        .and_then(serde_json::Value::as_f64)
}

#[async_trait]
impl CurrencyRate for CurrencyLayerClient {
    #[instrument(skip(self))]
    async fn usd_rate(&self, target: &str) -> Result<Option<f64>, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::unconfigured(SERVICE))?;

        let response = self
            .http
            .get(ENDPOINT)
            .query(&[
                ("access_key", api_key),
                ("currencies", target),
                ("source", "USD"),
                ("format", "1"),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let body: LiveResponse = read_json(SERVICE, response).await?;
        Ok(usd_quote(&body, target))
    }
}
