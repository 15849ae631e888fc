use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;

use super::classification::ClassificationResult;
use super::dose::DoseResult;
use super::validation::ValidationError;

/// Hospitalization or ICU indication with every reason that fired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Indication {
    pub indicated: bool,
    pub reasons: Vec<String>,
}

impl Indication {
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            indicated: !reasons.is_empty(),
            reasons,
        }
    }
}

/// The complete output of one protocol calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalculationResult {
    pub protocol_id: String,
    pub protocol_name: String,
    pub classification: ClassificationResult,
    pub doses: Vec<DoseResult>,
    pub hospitalization: Indication,
    pub icu_indication: Option<Indication>,
    pub recommendations: Vec<String>,
    /// Only populated when hospitalization is not indicated.
    pub discharge_criteria: Vec<String>,
}

impl CalculationResult {
    pub fn dose(&self, medication: &str) -> Option<&DoseResult> {
        self.doses.iter().find(|d| d.medication == medication)
    }
}

/// Either a computed result or the full list of input problems.
///
/// Serializes as `{ "ok": true, "result": … }` or
/// `{ "ok": false, "errors": […] }`.
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationOutcome {
    Computed(Box<CalculationResult>),
    Rejected(Vec<ValidationError>),
}

impl CalculationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CalculationOutcome::Computed(_))
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        match self {
            CalculationOutcome::Computed(result) => Some(result),
            CalculationOutcome::Rejected(_) => None,
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            CalculationOutcome::Computed(_) => &[],
            CalculationOutcome::Rejected(errors) => errors,
        }
    }
}

impl Serialize for CalculationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CalculationOutcome", 2)?;
        match self {
            CalculationOutcome::Computed(result) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("result", result)?;
            }
            CalculationOutcome::Rejected(errors) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("errors", errors)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation::ValidationCode;

    #[test]
    fn indication_follows_reasons() {
        assert!(!Indication::from_reasons(vec![]).indicated);
        let indication = Indication::from_reasons(vec!["SpO2 < 92%".to_string()]);
        assert!(indication.indicated);
        assert_eq!(indication.reasons.len(), 1);
    }

    #[test]
    fn rejected_outcome_serializes_with_ok_false() {
        let outcome = CalculationOutcome::Rejected(vec![ValidationError::new(
            "weight",
            ValidationCode::OutOfRange,
            "deve ser maior que 0",
        )]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["errors"][0]["field"], "weight");
        assert_eq!(json["errors"][0]["code"], "out_of_range");
        assert!(json.get("result").is_none());
    }
}
