use std::env;
use std::time::Duration;

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Process-level settings for the HTTP surface. Collaborator credentials live
/// in `IntegrationConfig`.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub bind: String,
    pub database_url: Option<String>,
    pub request_timeout: Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            database_url: None,
            request_timeout: Duration::from_secs(120),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 30,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        }
    }
}

impl ApiSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env_string("DREAMTRIP_BIND").unwrap_or(defaults.bind),
            database_url: env_string("DREAMTRIP_DATABASE_URL"),
            request_timeout: env_parsed("DREAMTRIP_REQUEST_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            rate_limit_window: env_parsed("DREAMTRIP_RATE_LIMIT_WINDOW_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env_parsed("DREAMTRIP_RATE_LIMIT_MAX")
                .unwrap_or(defaults.rate_limit_max),
            allowed_origins: env_string("DREAMTRIP_ALLOWED_ORIGINS")
                .map(|value| parse_origins(&value))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|value| value.parse::<T>().ok())
}

pub(crate) fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
