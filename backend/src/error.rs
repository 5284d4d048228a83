//! Error handling for the weather alert evaluator
//!
//! Only dependency health and pending-alert retrieval are cycle-fatal; the
//! other variants are raised by a single fetch or write and absorbed by the
//! cycle.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Cycle-fatal errors
    #[error("{service} is unavailable: {reason}")]
    DependencyUnavailable { service: String, reason: String },

    #[error("Alert store error: {0}")]
    AlertStore(String),

    // Errors absorbed by the cycle
    #[error("Weather fetch failed: {0}")]
    WeatherFetch(String),

    #[error("Alert write-back failed: {0}")]
    WriteBackTransport(String),

    #[error("An evaluation cycle is already running")]
    CycleInProgress,

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn unavailable(service: &str, reason: impl Into<String>) -> Self {
        AppError::DependencyUnavailable {
            service: service.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::DependencyUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "DEPENDENCY_UNAVAILABLE")
            }
            AppError::AlertStore(_) => (StatusCode::BAD_GATEWAY, "ALERT_STORE_ERROR"),
            AppError::WeatherFetch(_) => (StatusCode::BAD_GATEWAY, "WEATHER_FETCH_ERROR"),
            AppError::WriteBackTransport(_) => (StatusCode::BAD_GATEWAY, "WRITE_BACK_ERROR"),
            AppError::CycleInProgress => (StatusCode::CONFLICT, "CYCLE_IN_PROGRESS"),
            AppError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            AppError::Internal(_) | AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and clients
pub type AppResult<T> = Result<T, AppError>;
