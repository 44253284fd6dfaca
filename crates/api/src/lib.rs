mod rate_limit;
mod settings;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Json, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use dreamtrip_agents::{PlannerConfig, TripPlanner};
use dreamtrip_core::TripParameters;
use dreamtrip_integrations::{Capabilities, Collaborators, IntegrationConfig};
use dreamtrip_observability::{AppMetrics, MetricsSnapshot};
use dreamtrip_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use crate::rate_limit::ClientRateLimiter;
pub use crate::settings::ApiSettings;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 100;
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<TripPlanner<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: ClientRateLimiter,
    pub store_backend: &'static str,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    store: &'static str,
    metrics: MetricsSnapshot,
    capabilities: Capabilities,
}

#[derive(Debug, Deserialize)]
struct DescriptionRequest {
    description: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

/// Wires collaborators, the context store and the planner into a router.
pub async fn build_app(
    settings: ApiSettings,
    integrations: IntegrationConfig,
) -> Result<Router> {
    let metrics = AppMetrics::shared();
    let collaborators = Collaborators::from_config(&integrations)?;
    let store = Store::from_database_url(settings.database_url.as_deref()).await?;
    let store_backend = store.backend();

    let planner = Arc::new(TripPlanner::new(
        collaborators,
        PlannerConfig::default(),
        Arc::new(store),
        metrics.clone(),
    ));

    info!(
        store = store_backend,
        capabilities = ?planner.capabilities(),
        "trip planner ready"
    );

    let state = ApiState {
        planner,
        metrics,
        limiter: ClientRateLimiter::new(settings.rate_limit_window, settings.rate_limit_max),
        store_backend,
        allowed_origins: Arc::new(settings.allowed_origins.clone()),
    };

    Ok(build_router(state, &settings))
}

pub fn build_router(state: ApiState, settings: &ApiSettings) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/trip/interpret", post(interpret))
        .route("/api/v1/trip/generate", post(generate))
        .route("/api/v1/trip/plan", post(plan))
        .route("/api/v1/trip/history", get(history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        // rejections above still pass through tracing, request ids and CORS
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(&state.allowed_origins))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        store: state.store_backend,
        metrics: state.metrics.snapshot(),
        capabilities: state.planner.capabilities(),
    };
    (StatusCode::OK, Json(payload))
}

async fn interpret(
    State(state): State<ApiState>,
    Json(request): Json<DescriptionRequest>,
) -> Response {
    let Some(description) = non_blank(&request.description) else {
        return invalid_request("description must not be empty");
    };
    let params = state.planner.interpret(description).await;
    (StatusCode::OK, Json(params)).into_response()
}

async fn generate(
    State(state): State<ApiState>,
    Json(params): Json<TripParameters>,
) -> Response {
    if let Err(reason) = params.check_invariants() {
        return invalid_request(&reason);
    }
    match state.planner.generate(params).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => internal_error("generate_failed", &err),
    }
}

async fn plan(
    State(state): State<ApiState>,
    Json(request): Json<DescriptionRequest>,
) -> Response {
    let Some(description) = non_blank(&request.description) else {
        return invalid_request("description must not be empty");
    };
    match state.planner.plan(description).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => internal_error("plan_failed", &err),
    }
}

async fn history(State(state): State<ApiState>, Query(query): Query<HistoryQuery>) -> Response {
    let limit = history_limit(query.limit);
    match state.planner.history(limit).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => internal_error("history_failed", &err),
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn history_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

fn invalid_request(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({
            "error": "invalid_request",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error(kind: &'static str, err: &anyhow::Error) -> Response {
    error!(error = %format!("{err:#}"), kind, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": kind,
            "message": err.to_string()
        })),
    )
        .into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let client = client_key(&request);
    if !state.limiter.allow(&client) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this client"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

/// First `x-forwarded-for` hop, or a shared bucket when the header is absent.
fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_limit_defaults_and_clamps() {
        assert_eq!(history_limit(None), 20);
        assert_eq!(history_limit(Some(0)), 1);
        assert_eq!(history_limit(Some(500)), 100);
        assert_eq!(history_limit(Some(7)), 7);
    }

    #[test]
    fn client_key_uses_first_forwarded_hop() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.9");

        let anonymous = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&anonymous), "anonymous");
    }

    #[test]
    fn blank_descriptions_are_rejected() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" Bali "), Some("Bali"));
    }
}
