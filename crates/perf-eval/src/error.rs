use crate::config::ConfigError;
use crate::evaluations::router::evaluation_error_response;
use crate::evaluations::EvaluationServiceError;
use crate::governance::router::catalog_error_response;
use crate::governance::CategoryServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Catalog(CategoryServiceError),
    Evaluation(EvaluationServiceError),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Evaluation(err) => write!(f, "evaluation error: {}", err),
            AppError::Usage(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Catalog(err) => return catalog_error_response(err),
            AppError::Evaluation(err) => return evaluation_error_response(err),
            AppError::Usage(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CategoryServiceError> for AppError {
    fn from(value: CategoryServiceError) -> Self {
        Self::Catalog(value)
    }
}

impl From<EvaluationServiceError> for AppError {
    fn from(value: EvaluationServiceError) -> Self {
        Self::Evaluation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluations::EvaluationId;
    use crate::governance::{RepositoryError, WeightError};
    use rust_decimal::Decimal;

    #[test]
    fn domain_rejections_keep_their_router_statuses() {
        let weights = AppError::from(CategoryServiceError::Weights(
            WeightError::WeightSumInvalid {
                total: Decimal::from(90),
            },
        ));
        assert_eq!(
            weights.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let locked = AppError::from(EvaluationServiceError::EvaluationLocked(EvaluationId(3)));
        assert_eq!(locked.into_response().status(), StatusCode::CONFLICT);

        let missing = AppError::from(EvaluationServiceError::EvaluationNotFound(EvaluationId(4)));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let stale = AppError::from(CategoryServiceError::Repository(
            RepositoryError::StaleVersion,
        ));
        assert_eq!(stale.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn usage_errors_are_bad_requests() {
        let usage = AppError::Usage("unknown category 'Leadership'".to_string());
        assert_eq!(usage.to_string(), "invalid input: unknown category 'Leadership'");
        assert_eq!(usage.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = AppError::from(CategoryServiceError::Repository(
            RepositoryError::Unavailable("catalog offline".to_string()),
        ));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
