//! Manual evaluation trigger

use axum::{extract::State, Json};

use crate::error::{AppError, AppResult};
use crate::services::CycleSummary;
use crate::AppState;

/// Run one evaluation cycle and return its summary.
///
/// The cycle runs in its own task so a dropped request never cuts it short.
pub async fn run_evaluation(State(state): State<AppState>) -> AppResult<Json<CycleSummary>> {
    let evaluator = state.evaluator.clone();
    let summary = tokio::spawn(async move { evaluator.run_cycle().await })
        .await
        .map_err(|e| AppError::Internal(format!("Evaluation task failed: {}", e)))??;
    Ok(Json(summary))
}
