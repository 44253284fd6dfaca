use async_trait::async_trait;
use dreamtrip_core::{CollaboratorError, GenerativeInference};
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::{network_error, read_json};

const SERVICE: &str = "gemini";
const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl GenerativeInference for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::unconfigured(SERVICE))?;

        let payload = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http
            .post(format!("{ENDPOINT}/{}:generateContent", self.model))
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        let body: Value = read_json(SERVICE, response).await?;
        extract_candidate_text(&body)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CollaboratorError::InvalidResponse("no candidate text".to_string()))
    }
}

fn extract_candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let chunks = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>();
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join(""))
    }
}
