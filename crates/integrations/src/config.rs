use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 20;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(6);

/// Credentials and transport settings for every external collaborator.
/// A missing credential leaves that collaborator unconfigured.
#[derive(Debug, Clone, Default)]
pub struct IntegrationConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub places_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub currency_api_key: Option<String>,
    pub routing_api_key: Option<String>,
    pub http_timeout: Duration,
}

impl IntegrationConfig {
    pub fn from_env() -> Self {
        let gemini_api_key = env_value("DREAMTRIP_GEMINI_API_KEY");
        let places_api_key =
            env_value("DREAMTRIP_PLACES_API_KEY").or_else(|| gemini_api_key.clone());

        Self {
            gemini_api_key,
            gemini_model: env_value("DREAMTRIP_GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            search_api_key: env_value("DREAMTRIP_SEARCH_API_KEY"),
            search_engine_id: env_value("DREAMTRIP_SEARCH_ENGINE_ID"),
            places_api_key,
            weather_api_key: env_value("DREAMTRIP_WEATHER_API_KEY"),
            currency_api_key: env_value("DREAMTRIP_CURRENCY_API_KEY"),
            routing_api_key: env_value("DREAMTRIP_ROUTING_API_KEY"),
            http_timeout: Duration::from_secs(
                env_value("DREAMTRIP_HTTP_TIMEOUT_SECONDS")
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS),
            ),
        }
    }

    /// No credentials at all; every collaborator degrades.
    pub fn offline() -> Self {
        Self {
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            ..Self::default()
        }
    }

    pub fn build_http_client(&self) -> Result<Client> {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.http_timeout)
            .build()
            .context("failed to build HTTP client")
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_config_has_no_credentials() {
        let config = IntegrationConfig::offline();
        assert!(config.gemini_api_key.is_none());
        assert!(config.places_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.http_timeout, Duration::from_secs(20));
        assert!(config.build_http_client().is_ok());
    }
}
