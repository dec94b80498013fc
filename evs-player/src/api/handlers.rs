//! HTTP request handlers

use super::server::AppContext;
use crate::backend::BackendId;
use crate::estimator::BackendStats;
use crate::orchestrator::OrchestratorSnapshot;
use crate::request::SwitchRequest;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    port: u16,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

impl StatusResponse {
    fn new(status: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: status.into(),
        })
    }
}

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "evs-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: ctx.port,
    })
}

/// POST /switch
///
/// The body is parsed by hand so malformed requests get 400 with a reason
/// instead of the extractor's 422. Accepted requests are queued and the
/// response does not wait for the switch.
pub async fn submit_switch(
    State(ctx): State<AppContext>,
    body: String,
) -> (StatusCode, Json<StatusResponse>) {
    match SwitchRequest::from_json(&body) {
        Ok(request) => {
            info!(
                "Switch request: {}:{} @ {:.2}s",
                request.backend, request.media_id, request.target_position_seconds
            );
            ctx.requests.publish(request);
            (StatusCode::ACCEPTED, StatusResponse::new("accepted"))
        }
        Err(e) => {
            warn!("Rejected switch request: {}", e);
            (StatusCode::BAD_REQUEST, StatusResponse::new(e.to_string()))
        }
    }
}

/// GET /state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<OrchestratorSnapshot> {
    Json(ctx.orchestrator.snapshot())
}

/// GET /stats - statistics for every back-end
pub async fn get_stats(State(ctx): State<AppContext>) -> Json<Vec<BackendStats>> {
    let estimator = ctx.orchestrator.estimator();
    let mut estimator = estimator.lock().await;
    Json(BackendId::ALL.iter().map(|b| estimator.stats(*b)).collect())
}

/// GET /stats/:backend/report - boxed text report
pub async fn get_stats_report(
    State(ctx): State<AppContext>,
    Path(backend): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<StatusResponse>)> {
    let backend: BackendId = backend
        .parse()
        .map_err(|e: String| (StatusCode::NOT_FOUND, StatusResponse::new(e)))?;

    let estimator = ctx.orchestrator.estimator();
    let report = estimator.lock().await.report(backend);
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], report))
}
