use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use jiff::Timestamp;
use serde::Deserialize;
use serde_json::Value;

use pedi_core::models::result::CalculationOutcome;
use pedi_export::docx::generate_docx;
use pedi_export::render::render_default;
use pedi_export::styles::DocumentStyles;

use crate::error::ApiError;
use crate::routes::calculate::outcome_status;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExportRequest {
    pub parameters: Value,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Markdown-ish text for the clipboard.
    #[default]
    Text,
    Docx,
}

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Calculate and return the result as clipboard text or a DOCX handout.
/// Rejected parameters come back exactly as from `/calculate`.
pub async fn export_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.registry.calculate(&id, &req.parameters)?;
    let result = match outcome {
        CalculationOutcome::Computed(result) => result,
        rejected @ CalculationOutcome::Rejected(_) => {
            return Ok((outcome_status(&rejected), Json(rejected)).into_response());
        }
    };

    let rendered = render_default(&result, Timestamp::now())?;
    let response = match req.format {
        ExportFormat::Text => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            rendered,
        )
            .into_response(),
        ExportFormat::Docx => {
            let bytes = generate_docx(&rendered, &DocumentStyles::default())?;
            ([(header::CONTENT_TYPE, DOCX_CONTENT_TYPE)], bytes).into_response()
        }
    };

    tracing::info!(protocol_id = %id, format = ?req.format, "result exported");
    Ok(response)
}
