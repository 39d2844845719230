//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::infrastructure::cache::PoolError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Session store initialization failed: {0}")]
    SessionStore(String),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Type {type_name} is not registered for session storage")]
    UnregisteredType { type_name: &'static str },

    #[error("Registration conflict: {0}")]
    RegistrationConflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Pool(PoolError::Exhausted) => {
                tracing::warn!("Redis connection pool exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    10009,
                    "Service temporarily unavailable".into(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Connection pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
            AppError::Session(e) => {
                tracing::error!("Session error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
            other => {
                tracing::error!("Internal error: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        let body = ErrorResponse { code, message };

        (status, Json(body)).into_response()
    }
}
