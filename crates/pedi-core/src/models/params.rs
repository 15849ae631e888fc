use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A normalized field value after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Name of the derived field holding the patient's age in months.
pub const AGE_MONTHS: &str = "ageMonths";
/// Name of the derived field holding the patient's age in (fractional) years.
pub const AGE_YEARS: &str = "ageYears";

/// Validated, normalized patient parameters for one calculation.
///
/// Built only by the input validator. Fields declared `Unassessed` by the
/// protocol and absent from the input are simply missing from `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientParameters {
    pub weight_kg: f64,
    pub age_months: f64,
    pub values: BTreeMap<String, FieldValue>,
}

impl PatientParameters {
    pub fn new(weight_kg: f64, age_months: f64, values: BTreeMap<String, FieldValue>) -> Self {
        Self {
            weight_kg,
            age_months,
            values,
        }
    }

    pub fn age_years(&self) -> f64 {
        self.age_months / 12.0
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Numeric value of `field`, including the derived age fields.
    pub fn number(&self, field: &str) -> Option<f64> {
        match field {
            AGE_MONTHS => Some(self.age_months),
            AGE_YEARS => Some(self.age_years()),
            _ => self.values.get(field).and_then(FieldValue::as_number),
        }
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.values.get(field).and_then(FieldValue::as_bool)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(FieldValue::as_text)
    }
}
