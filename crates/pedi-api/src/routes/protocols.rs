use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use pedi_protocols::definition::ProtocolDefinition;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProtocolSummary {
    id: String,
    name: String,
    description: String,
}

/// Catalog listing, in registry order.
pub async fn list_protocols(State(state): State<AppState>) -> Json<Vec<ProtocolSummary>> {
    let protocols = state
        .registry
        .protocols()
        .iter()
        .map(|p| ProtocolSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
        })
        .collect();
    Json(protocols)
}

/// The full definition: fields, levels, rules and medications.
pub async fn get_protocol(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProtocolDefinition>, ApiError> {
    let protocol = state
        .registry
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("protocol not found: {id}")))?;
    Ok(Json(protocol.clone()))
}
