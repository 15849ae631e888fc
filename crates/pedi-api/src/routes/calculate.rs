use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

use pedi_core::models::result::CalculationOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// Status for a finished calculation: 200 when computed, 422 when the
/// parameters were rejected.
pub fn outcome_status(outcome: &CalculationOutcome) -> StatusCode {
    if outcome.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

pub async fn calculate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<CalculationOutcome>), ApiError> {
    let outcome = state.registry.calculate(&id, &raw)?;
    if let Some(result) = outcome.result() {
        tracing::info!(
            protocol_id = %id,
            level = %result.classification.level.id,
            dose_count = result.doses.len(),
            "calculation served"
        );
    }
    Ok((outcome_status(&outcome), Json(outcome)))
}
