//! The `calculate` entry point: validator, classification, doses and
//! recommendations, in sequence, producing one complete result or an error.

use serde_json::Value;

use pedi_core::models::result::{CalculationOutcome, CalculationResult};

use crate::classify::classify;
use crate::compose::compose;
use crate::definition::ProtocolDefinition;
use crate::dose::compute_doses;
use crate::error::ProtocolError;
use crate::registry::Registry;
use crate::validate::validate;

/// Run a calculation against a protocol in `registry`.
///
/// Invalid input comes back as `Ok(CalculationOutcome::Rejected)`; defects in
/// the protocol data or arithmetic failures are `Err`.
pub fn calculate(
    registry: &Registry,
    protocol_id: &str,
    raw: &Value,
) -> Result<CalculationOutcome, ProtocolError> {
    let protocol = registry
        .get(protocol_id)
        .ok_or_else(|| ProtocolError::UnknownProtocol(protocol_id.to_string()))?;
    calculate_with(protocol, raw)
}

pub fn calculate_with(
    protocol: &ProtocolDefinition,
    raw: &Value,
) -> Result<CalculationOutcome, ProtocolError> {
    let params = match validate(protocol, raw) {
        Ok(params) => params,
        Err(errors) => {
            tracing::debug!(
                protocol_id = %protocol.id,
                error_count = errors.len(),
                "parameters rejected"
            );
            return Ok(CalculationOutcome::Rejected(errors));
        }
    };

    let classification = classify(protocol, &params)?;
    let doses = compute_doses(protocol, &params, &classification)?;
    let bundle = compose(protocol, &params, &classification, &doses)?;

    tracing::debug!(
        protocol_id = %protocol.id,
        level = %classification.level.id,
        dose_count = doses.len(),
        hospitalization = bundle.hospitalization.indicated,
        "calculation complete"
    );

    Ok(CalculationOutcome::Computed(Box::new(CalculationResult {
        protocol_id: protocol.id.clone(),
        protocol_name: protocol.name.clone(),
        classification,
        doses,
        hospitalization: bundle.hospitalization,
        icu_indication: bundle.icu_indication,
        recommendations: bundle.recommendations,
        discharge_criteria: bundle.discharge_criteria,
    })))
}
