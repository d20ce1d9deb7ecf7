use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    CategoryId, CategoryUpdate, CriteriaId, NewCategory, NewCriteria, NewRoleDescription, RoleId,
};
use super::repository::{CategoryRepository, CriteriaRepository, RepositoryError};
use super::service::{CategoryService, CategoryServiceError};
use super::weights::{AppliedWeight, ProposedWeight, WeightValidation};

#[derive(Debug, Deserialize, Serialize)]
pub struct RebalanceRequest {
    pub weights: Vec<ProposedWeight>,
}

#[derive(Debug, Serialize)]
pub struct RebalanceResponse {
    pub applied: Vec<AppliedWeight>,
    pub validation: WeightValidation,
}

#[derive(Debug, Deserialize)]
pub struct CreateCriteriaRequest {
    pub name: String,
    pub base_description: String,
}

/// Router exposing category administration and weight governance.
pub fn category_router<C>(service: Arc<CategoryService<C>>) -> Router
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/criteria-categories",
            get(list_handler::<C>).post(create_handler::<C>),
        )
        .route(
            "/api/v1/criteria-categories/validate-weights",
            get(validate_handler::<C>),
        )
        .route(
            "/api/v1/criteria-categories/rebalance",
            post(rebalance_handler::<C>),
        )
        .route(
            "/api/v1/criteria-categories/:category_id",
            get(get_handler::<C>)
                .put(update_handler::<C>)
                .delete(deactivate_handler::<C>),
        )
        .route(
            "/api/v1/criteria-categories/:category_id/criteria",
            get(list_criteria_handler::<C>).post(create_criteria_handler::<C>),
        )
        .route(
            "/api/v1/criteria/:criteria_id",
            get(describe_handler::<C>),
        )
        .route(
            "/api/v1/criteria/:criteria_id/roles/:role_id",
            get(describe_for_role_handler::<C>).put(role_description_handler::<C>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<C>(State(service): State<Arc<CategoryService<C>>>) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.list_categories() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn create_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Json(category): Json<NewCategory>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.create_category(category) {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn get_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path(category_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.get_category(CategoryId(category_id)) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn update_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path(category_id): Path<u64>,
    Json(update): Json<CategoryUpdate>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.update_category(CategoryId(category_id), update) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn deactivate_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path(category_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.set_category_active(CategoryId(category_id), false) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn validate_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.validate_weights() {
        Ok(validation) => (StatusCode::OK, Json(validation)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn rebalance_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Json(request): Json<RebalanceRequest>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    let applied = match service.rebalance_weights(&request.weights) {
        Ok(applied) => applied,
        Err(err) => return catalog_error_response(err),
    };

    match service.validate_weights() {
        Ok(validation) => (
            StatusCode::OK,
            Json(RebalanceResponse {
                applied,
                validation,
            }),
        )
            .into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn list_criteria_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path(category_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.list_criteria_for_category(CategoryId(category_id)) {
        Ok(criteria) => (StatusCode::OK, Json(criteria)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn create_criteria_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path(category_id): Path<u64>,
    Json(request): Json<CreateCriteriaRequest>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    let criteria = NewCriteria {
        category_id: CategoryId(category_id),
        name: request.name,
        base_description: request.base_description,
    };
    match service.create_criteria(criteria) {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn describe_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path(criteria_id): Path<u64>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.describe_criteria(CriteriaId(criteria_id), None) {
        Ok(description) => (StatusCode::OK, Json(description)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn describe_for_role_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path((criteria_id, role_id)): Path<(u64, u64)>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    match service.describe_criteria(CriteriaId(criteria_id), Some(RoleId(role_id))) {
        Ok(description) => (StatusCode::OK, Json(description)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleDescriptionRequest {
    pub description: String,
    #[serde(default)]
    pub example: Option<String>,
}

pub(crate) async fn role_description_handler<C>(
    State(service): State<Arc<CategoryService<C>>>,
    Path((criteria_id, role_id)): Path<(u64, u64)>,
    Json(request): Json<RoleDescriptionRequest>,
) -> Response
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    let description = NewRoleDescription {
        role_id: RoleId(role_id),
        description: request.description,
        example: request.example,
    };
    match service.set_role_description(CriteriaId(criteria_id), description) {
        Ok(stored) => (StatusCode::OK, Json(stored)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) fn catalog_error_response(err: CategoryServiceError) -> Response {
    let status = match &err {
        CategoryServiceError::Weights(_) | CategoryServiceError::BlankName => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CategoryServiceError::CategoryNotFound(_)
        | CategoryServiceError::CriteriaNotFound(_)
        | CategoryServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CategoryServiceError::DuplicateName(_)
        | CategoryServiceError::Repository(RepositoryError::Conflict)
        | CategoryServiceError::Repository(RepositoryError::StaleVersion) => StatusCode::CONFLICT,
        CategoryServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
