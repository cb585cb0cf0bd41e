use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::lifecycle::LifecycleError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn gateway_response(err: &GatewayError) -> (StatusCode, String) {
    match err {
        GatewayError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        GatewayError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
        GatewayError::Storage(msg) => {
            tracing::error!("Storage error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        }
        other => {
            tracing::error!("Gateway error: {}", other);
            (
                StatusCode::BAD_GATEWAY,
                "Program service unavailable".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Gateway(e) => gateway_response(e),
            AppError::Lifecycle(e) => match e {
                LifecycleError::Gateway(inner) => gateway_response(inner),
                LifecycleError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                LifecycleError::EmptyPerformance => {
                    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
                }
                _ => {
                    tracing::warn!("Lifecycle error: {}", e);
                    (StatusCode::CONFLICT, e.to_string())
                }
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
