//! Integration tests for the EVS Player HTTP API

mod helpers;

use axum::body::Body;
use axum::http::StatusCode;
use evs_player::api::{create_router, AppContext};
use evs_player::backend::BackendId;
use evs_player::config::TomlConfig;
use evs_player::request::{request_channel, RequestSource};
use helpers::{Harness, RecordingDriverFactory};
use http::{Method, Request};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

async fn setup_test_server() -> (axum::Router, RequestSource, Harness) {
    let harness = Harness::new(
        TomlConfig::default(),
        RecordingDriverFactory::new(Some(Duration::from_millis(100))),
    )
    .await;
    let (publisher, source) = request_channel();
    let router = create_router(AppContext {
        orchestrator: harness.orchestrator.clone(),
        requests: publisher,
        port: 5760,
    });
    (router, source, harness)
}

async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<String>,
) -> (StatusCode, String) {
    let request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (app, _source, _harness) = setup_test_server().await;

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["module"], "evs-player");
    assert_eq!(json["port"], 5760);
}

#[tokio::test]
async fn test_switch_accepted_and_forwarded() {
    let (app, mut source, _harness) = setup_test_server().await;
    let body = json!({
        "platform": "youtube",
        "videoId": "dQw4w9WgXcQ",
        "targetTime": 42.5,
        "systemUnixTime": 1_700_000_000_000i64,
        "duration": 212
    });

    let (status, _) = make_request(&app, Method::POST, "/switch", Some(body.to_string())).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let request = tokio::time::timeout(Duration::from_secs(1), source.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.backend, BackendId::YouTube);
    assert_eq!(request.media_id, "dQw4w9WgXcQ");
    assert_eq!(request.target_position_seconds, 42.5);
    assert_eq!(request.duration_seconds, Some(212.0));
}

#[tokio::test]
async fn test_invalid_switch_rejected() {
    let (app, _source, _harness) = setup_test_server().await;

    for body in [
        "not json".to_string(),
        json!({"videoId": "abc", "targetTime": -3, "systemUnixTime": 1}).to_string(),
        json!({"platform": "vimeo", "videoId": "abc", "targetTime": 1, "systemUnixTime": 1})
            .to_string(),
    ] {
        let (status, response) =
            make_request(&app, Method::POST, "/switch", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
        let json: Value = serde_json::from_str(&response).unwrap();
        assert!(json["status"].as_str().unwrap().contains("Invalid request"));
    }
}

#[tokio::test]
async fn test_state_snapshot() {
    let (app, _source, _harness) = setup_test_server().await;

    let (status, body) = make_request(&app, Method::GET, "/state", None).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["active_surface"], 0);
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["transitioning"], false);
    assert_eq!(json["switch_sequence"], 0);
    assert!(json["last_media_id"].is_null());
}

#[tokio::test]
async fn test_stats_for_every_backend() {
    let (app, _source, harness) = setup_test_server().await;
    {
        let estimator = harness.orchestrator.estimator();
        let mut estimator = estimator.lock().await;
        for ms in [400.0, 600.0, 800.0] {
            estimator.record_load_time(BackendId::YouTube, ms);
        }
    }

    let (status, body) = make_request(&app, Method::GET, "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let stats = json.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["backend"], "youtube");
    assert_eq!(stats[0]["sample_count"], 3);
    assert_eq!(stats[0]["mean_ms"], 600.0);
    assert_eq!(stats[1]["backend"], "bilibili");
    assert_eq!(stats[1]["sample_count"], 0);
    assert_eq!(stats[1]["recommended_lookahead_seconds"], 4.0);
}

#[tokio::test]
async fn test_text_report() {
    let (app, _source, _harness) = setup_test_server().await;

    let (status, body) = make_request(&app, Method::GET, "/stats/bilibili/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[Network:bilibili] no data");

    let (status, _) = make_request(&app, Method::GET, "/stats/vimeo/report", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
