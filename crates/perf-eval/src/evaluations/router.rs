use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{EmployeeId, EvaluationId, NewEvaluation};
use super::repository::{EvaluationRepository, NotificationPublisher};
use super::service::{EvaluationService, EvaluationServiceError};
use crate::governance::domain::CriteriaId;
use crate::governance::repository::{CategoryRepository, CriteriaRepository, RepositoryError};

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub score: u8,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub general_comments: Option<String>,
}

/// Router exposing evaluation lifecycle and score endpoints.
pub fn evaluation_router<C, E, N>(service: Arc<EvaluationService<C, E, N>>) -> Router
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/evaluations", post(create_handler::<C, E, N>))
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(detail_handler::<C, E, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/breakdown",
            get(breakdown_handler::<C, E, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/scores/:criteria_id",
            put(score_handler::<C, E, N>).delete(remove_score_handler::<C, E, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/scores/:criteria_id/comments",
            post(comment_handler::<C, E, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/submit",
            post(submit_handler::<C, E, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/complete",
            post(complete_handler::<C, E, N>),
        )
        .route(
            "/api/v1/employees/:employee_id/evaluations",
            get(employee_handler::<C, E, N>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Json(request): Json<NewEvaluation>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_evaluation(request) {
        Ok(evaluation) => (StatusCode::CREATED, Json(evaluation)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn detail_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path(evaluation_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.detail(EvaluationId(evaluation_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn breakdown_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path(evaluation_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.score_breakdown(EvaluationId(evaluation_id)) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn score_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path((evaluation_id, criteria_id)): Path<(u64, u64)>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.record_score(
        EvaluationId(evaluation_id),
        CriteriaId(criteria_id),
        request.score,
    ) {
        Ok(recorded) => (StatusCode::OK, Json(recorded)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn remove_score_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path((evaluation_id, criteria_id)): Path<(u64, u64)>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.remove_score(EvaluationId(evaluation_id), CriteriaId(criteria_id)) {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn comment_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path((evaluation_id, criteria_id)): Path<(u64, u64)>,
    Json(request): Json<CommentRequest>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.add_comment(
        EvaluationId(evaluation_id),
        CriteriaId(criteria_id),
        &request.description,
    ) {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn submit_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path(evaluation_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(EvaluationId(evaluation_id)) {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn complete_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path(evaluation_id): Path<u64>,
    request: Option<Json<CompleteRequest>>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let general_comments = request.and_then(|Json(request)| request.general_comments);
    match service.complete(EvaluationId(evaluation_id), general_comments) {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn employee_handler<C, E, N>(
    State(service): State<Arc<EvaluationService<C, E, N>>>,
    Path(employee_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.list_for_employee(EmployeeId(employee_id)) {
        Ok(evaluations) => (StatusCode::OK, Json(evaluations)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) fn evaluation_error_response(err: EvaluationServiceError) -> Response {
    let status = match &err {
        EvaluationServiceError::Weights(_)
        | EvaluationServiceError::ScoreOutOfRange { .. }
        | EvaluationServiceError::CriteriaInactive(_)
        | EvaluationServiceError::InvalidPeriod { .. }
        | EvaluationServiceError::SelfEvaluation(_)
        | EvaluationServiceError::BlankPeriod
        | EvaluationServiceError::BlankComment => StatusCode::UNPROCESSABLE_ENTITY,
        EvaluationServiceError::EvaluationNotFound(_)
        | EvaluationServiceError::CriteriaNotFound(_)
        | EvaluationServiceError::ScoreNotFound
        | EvaluationServiceError::CommentNotFound(_)
        | EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::EvaluationLocked(_)
        | EvaluationServiceError::InvalidTransition { .. }
        | EvaluationServiceError::Repository(RepositoryError::Conflict)
        | EvaluationServiceError::Repository(RepositoryError::StaleVersion) => {
            StatusCode::CONFLICT
        }
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
