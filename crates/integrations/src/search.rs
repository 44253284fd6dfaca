use async_trait::async_trait;
use dreamtrip_core::{CollaboratorError, SearchHit, TextSearch};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{network_error, read_json};

const SERVICE: &str = "custom_search";
const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Custom Search. Needs both the API key and the engine id.
pub struct CustomSearchClient {
    http: Client,
    credentials: Option<(String, String)>,
}

impl CustomSearchClient {
    pub fn new(http: Client, api_key: Option<String>, engine_id: Option<String>) -> Self {
        Self {
            http,
            credentials: api_key.zip(engine_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    link: Option<String>,
    snippet: Option<String>,
}

#[async_trait]
impl TextSearch for CustomSearchClient {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, CollaboratorError> {
        let (api_key, engine_id) = self
            .credentials
            .as_ref()
            .ok_or_else(|| CollaboratorError::unconfigured(SERVICE))?;

        let response = self
            .http
            .get(ENDPOINT)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
                ("q", query),
                ("num", limit.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let body: SearchResponse = read_json(SERVICE, response).await?;
        Ok(body
            .items
            .into_iter()
            .take(limit)
            .map(|item| SearchHit {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
            })
            .collect())
    }
}
