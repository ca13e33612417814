use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use jobboard::candidates::{candidates_router, CandidatesState, PlainTextExporter};
use jobboard::listings::{listings_router, ListingsState};
use jobboard::session::session_router;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes(services: &Services) -> axum::Router {
    let listings = Arc::new(ListingsState::new(
        Arc::clone(&services.store),
        Arc::clone(&services.sessions),
        Arc::clone(&services.desks),
    ));
    let candidates = Arc::new(CandidatesState {
        sessions: Arc::clone(&services.sessions),
        applications: services.application_desk(),
        layout: services.resume_layout,
        exporter: Arc::new(PlainTextExporter),
    });

    session_router(Arc::clone(&services.sessions))
        .merge(listings_router(listings))
        .merge(candidates_router(candidates))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
