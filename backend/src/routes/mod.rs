//! Route definitions for the weather alert evaluator

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/dependencies", get(handlers::dependency_health))
        .route("/evaluations", post(handlers::run_evaluation))
}
