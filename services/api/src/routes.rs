use crate::infra::{AppState, Categories, Evaluations};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use perf_eval::error::AppError;
use perf_eval::evaluations::evaluation_router;
use perf_eval::governance::category_router;
use serde_json::{json, Value};
use std::sync::Arc;

pub(crate) fn with_service_routes(
    categories: Arc<Categories>,
    evaluations: Arc<Evaluations>,
) -> axum::Router {
    category_router(categories.clone())
        .merge(evaluation_router(evaluations))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .layer(Extension(categories))
}

/// Liveness plus the current weight check. Invalid weights are reported, not fatal.
pub(crate) async fn healthcheck(
    Extension(categories): Extension<Arc<Categories>>,
) -> Result<Json<Value>, AppError> {
    let validation = categories.validate_weights()?;
    Ok(Json(json!({
        "status": "ok",
        "weights": validation,
    })))
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
