use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use bodega_catalog::store::CatalogError;
use bodega_order::workflow::WorkflowError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::Validation(_)
            | WorkflowError::InsufficientStock(_)
            | WorkflowError::InvalidStatus(_) => Self::ValidationError(err.to_string()),
            WorkflowError::CategoryNotFound(_)
            | WorkflowError::ItemNotFound { .. }
            | WorkflowError::OrderNotFound(_) => Self::NotFoundError(err.to_string()),
            WorkflowError::Storage(_) => Self::InternalServerError(err.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::MissingField(_)
            | CatalogError::DuplicateCategory(_)
            | CatalogError::NothingToUpdate
            | CatalogError::NegativeStock => Self::ValidationError(err.to_string()),
            CatalogError::CategoryNotFound(_) | CatalogError::ItemNotFound(_) => {
                Self::NotFoundError(err.to_string())
            }
            CatalogError::Storage(_) => Self::InternalServerError(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
