//! Dose calculator.

use pedi_core::models::classification::ClassificationResult;
use pedi_core::models::dose::{DoseResult, VolumeDose};
use pedi_core::models::params::PatientParameters;

use crate::definition::{MedicationRule, ProtocolDefinition};
use crate::error::{ComputationError, ConfigurationError, ProtocolError};
use crate::formula::FormulaError;
use crate::predicate::EvalContext;

// Slack for comparing a rounded amount against a cap-derived limit.
const LIMIT_TOLERANCE: f64 = 1e-9;

/// Compute every applicable medication of `protocol`, in declaration order.
pub fn compute_doses(
    protocol: &ProtocolDefinition,
    params: &PatientParameters,
    classification: &ClassificationResult,
) -> Result<Vec<DoseResult>, ProtocolError> {
    let ctx =
        EvalContext::with_classification(params, classification, &protocol.classification.levels);
    protocol
        .medications
        .iter()
        .filter(|rule| rule.applies_when.evaluate(&ctx))
        .map(|rule| compute_dose(&protocol.id, rule, params))
        .collect()
}

pub fn compute_dose(
    protocol_id: &str,
    rule: &MedicationRule,
    params: &PatientParameters,
) -> Result<DoseResult, ProtocolError> {
    let evaluated = rule.formula.evaluate(params).map_err(|e| match e {
        FormulaError::MissingField(field) => ConfigurationError::InvalidMedication {
            protocol: protocol_id.to_string(),
            medication: rule.name.clone(),
            detail: format!("formula field '{field}' has no value"),
        },
        FormulaError::NoBand(weight) => ConfigurationError::InvalidMedication {
            protocol: protocol_id.to_string(),
            medication: rule.name.clone(),
            detail: format!("no weight band covers {weight} kg"),
        },
    })?;

    if !evaluated.amount.is_finite() {
        return Err(ComputationError::NonFinite {
            protocol: protocol_id.to_string(),
            medication: rule.name.clone(),
        }
        .into());
    }
    if evaluated.amount < 0.0 {
        return Err(ComputationError::Negative {
            protocol: protocol_id.to_string(),
            medication: rule.name.clone(),
            amount: evaluated.amount,
        }
        .into());
    }

    let mut amount = rule.rounding.apply(evaluated.amount);
    if let Some(limit) = evaluated.limit
        && amount > limit + LIMIT_TOLERANCE
    {
        amount = rule.rounding.apply_down(evaluated.amount).min(limit);
    }

    let volume = match &rule.concentration {
        Some(concentration) => {
            let ml = concentration.volume_ml(amount, rule.unit).map_err(|source| {
                ComputationError::Conversion {
                    protocol: protocol_id.to_string(),
                    medication: rule.name.clone(),
                    source,
                }
            })?;
            Some(VolumeDose {
                ml: rule.volume_rounding.apply(ml),
                concentration: *concentration,
            })
        }
        None => None,
    };

    Ok(DoseResult {
        medication: rule.name.clone(),
        amount,
        unit: rule.unit,
        capped: evaluated.capped,
        route: rule.route.clone(),
        frequency: rule.frequency.clone(),
        volume,
        note: rule.note.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pedi_core::units::{DoseUnit, Rounding};

    use super::*;
    use crate::formula::DoseFormula;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn patient(weight_kg: f64) -> PatientParameters {
        PatientParameters::new(weight_kg, 60.0, BTreeMap::new())
    }

    #[test]
    fn suspension_volume_rounds_to_one_decimal() {
        let amoxicillin = MedicationRule::new(
            "Amoxicilina",
            DoseFormula::per_kg(50.0).capped(1500.0).divided(3),
            DoseUnit::Mg,
            "VO",
        )
        .concentration(250.0, 5.0)
        .rounding(Rounding::one_decimal());

        let dose = compute_dose("pneumonia", &amoxicillin, &patient(5.0)).unwrap();
        assert!(approx(dose.amount, 83.3));
        let volume = dose.volume.unwrap();
        assert!(approx(volume.ml, 1.7));
        assert!(!dose.capped);
    }

    #[test]
    fn ceiling_rounding_never_crosses_the_cap() {
        let salbutamol = MedicationRule::new(
            "Salbutamol spray",
            DoseFormula::per_kg(0.3).capped(10.0).divided(3),
            DoseUnit::Puffs,
            "inalatório",
        )
        .rounding(Rounding::CeilTo { step: 1.0 });

        // 0.3 x 40 = 12, capped at 10, divided by 3 = 3.33; ceil would give 4
        // and 3 x 4 = 12 > 10, so the limit of 3.33 keeps it at 3.
        let dose = compute_dose("asma", &salbutamol, &patient(40.0)).unwrap();
        assert!(approx(dose.amount, 3.0));
        assert!(dose.capped);
    }

    #[test]
    fn cap_property_holds_across_weights() {
        let rule = MedicationRule::new(
            "Adrenalina IM",
            DoseFormula::per_kg(0.01).capped(0.3),
            DoseUnit::Mg,
            "IM",
        );
        let mut weight = 0.5;
        while weight <= 150.0 {
            let dose = compute_dose("anafilaxia", &rule, &patient(weight)).unwrap();
            assert!(dose.amount <= 0.3 + 1e-12, "weight {weight} gave {}", dose.amount);
            if 0.01 * weight <= 0.3 {
                assert!(approx(dose.amount, Rounding::default().apply(0.01 * weight)));
            }
            weight += 0.5;
        }
    }

    #[test]
    fn formula_field_without_value_is_a_configuration_error() {
        let parkland = MedicationRule::new(
            "Ringer lactato",
            DoseFormula::per_kg(4.0).per_field("superficie_queimada"),
            DoseUnit::Ml,
            "IV",
        );
        let err = compute_dose("queimaduras", &parkland, &patient(20.0)).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Configuration(ConfigurationError::InvalidMedication { .. })
        ));
    }
}
