use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use dreamtrip_api::{build_app, ApiSettings};
use dreamtrip_integrations::IntegrationConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn offline_app() -> Router {
    build_app(ApiSettings::default(), IntegrationConfig::offline())
        .await
        .expect("app should build")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_missing_credentials() {
    let app = offline_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["store"], "memory");
    assert_eq!(parsed["capabilities"]["inference"], false);
    assert_eq!(parsed["capabilities"]["search"], false);
}

#[tokio::test]
async fn interpret_extracts_bali_without_inference() {
    let app = offline_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/trip/interpret",
            json!({ "description": "10 day trip to bali under $1000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(
        parsed["destination"].as_str().map(str::to_lowercase).as_deref(),
        Some("bali")
    );
    assert_eq!(parsed["duration_days"], 10);
    assert_eq!(parsed["budget_total"].as_f64(), Some(1000.0));
    assert_eq!(parsed["currency"], "USD");
}

#[tokio::test]
async fn interpret_rejects_blank_description() {
    let app = offline_app().await;

    let response = app
        .oneshot(post_json("/api/v1/trip/interpret", json!({ "description": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn generate_tokyo_includes_research_keys() {
    let app = offline_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/trip/generate",
            json!({ "destination": "Tokyo", "duration_days": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let research = &parsed["research_info"];
    assert!(research.get("weather").is_some());
    assert!(research.get("top_places").is_some());

    let weather_status = research["weather"]["status"].as_str().unwrap();
    assert!(["unavailable", "error", "ok"].contains(&weather_status));
    assert_eq!(parsed["itinerary"].as_array().map(Vec::len), Some(2));
    assert_eq!(parsed["status"], "generated");
}

#[tokio::test]
async fn generate_rejects_broken_parameters() {
    let app = offline_app().await;

    for body in [
        json!({ "destination": "", "duration_days": 2 }),
        json!({ "destination": "Tokyo", "duration_days": 0 }),
        json!({ "destination": "Tokyo", "duration_days": 366 }),
        json!({ "destination": "Tokyo", "duration_days": 4_000_000_000u64 }),
        json!({ "destination": "Tokyo", "duration_days": 2, "travelers": 0 }),
        json!({ "destination": "Tokyo", "duration_days": 2, "budget_total": -5.0 }),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/trip/generate", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn plan_then_history_lists_newest_first() {
    let app = offline_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/trip/plan",
            json!({ "description": "a weekend in Lisbon" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plan = read_json(response).await;
    assert_eq!(plan["itinerary"].as_array().map(Vec::len), Some(3));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/trip/history?limit=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let history = read_json(response).await;
    let kinds = history
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["kind"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec!["generate", "interpret"]);
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let settings = ApiSettings {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 1,
        ..ApiSettings::default()
    };
    let app = build_app(settings, IntegrationConfig::offline()).await.unwrap();

    let history = |client: &str| {
        Request::builder()
            .uri("/api/v1/trip/history")
            .header("x-forwarded-for", client)
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(history("198.51.100.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(history("198.51.100.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        second.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert!(second.headers().contains_key("x-request-id"));

    let other = app.oneshot(history("198.51.100.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}
