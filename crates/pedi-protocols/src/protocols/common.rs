//! Fields, predicates and medications shared by several protocols.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use crate::definition::{FieldSpec, MedicationRule};
use crate::formula::DoseFormula;
use crate::predicate::{Predicate, above, all, any, at_least, below};
use crate::validate::{AGE, AGE_UNIT, AGE_UNIT_OPTIONS, AGE_UNIT_YEARS, WEIGHT};

pub const SPO2: &str = "oxygenSaturation";
pub const RESPIRATORY_RATE: &str = "respiratoryRate";
pub const HEART_RATE: &str = "heartRate";
pub const SYSTOLIC_BP: &str = "systolicBp";
pub const TEMPERATURE: &str = "temperature";
pub const GLUCOSE: &str = "glucose";
pub const GLASGOW: &str = "glasgow";

/// Weight, age and age unit, in that order, followed by `extra`.
pub fn patient_fields(extra: Vec<FieldSpec>) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::number(WEIGHT, "Peso (kg)").above_up_to(0.0, 150.0),
        FieldSpec::number(AGE, "Idade").at_least(0.0),
        FieldSpec::choice(AGE_UNIT, "Unidade da idade", &AGE_UNIT_OPTIONS)
            .defaults_to_option(AGE_UNIT_YEARS),
    ];
    fields.extend(extra);
    fields
}

pub fn oxygen_saturation() -> FieldSpec {
    FieldSpec::number(SPO2, "Saturação de O₂ (%)")
        .between(0.0, 100.0)
        .unassessed()
}

pub fn respiratory_rate() -> FieldSpec {
    FieldSpec::integer(RESPIRATORY_RATE, "Frequência respiratória (irpm)")
        .between(0.0, 150.0)
        .unassessed()
}

pub fn heart_rate() -> FieldSpec {
    FieldSpec::integer(HEART_RATE, "Frequência cardíaca (bpm)")
        .between(0.0, 300.0)
        .unassessed()
}

pub fn systolic_bp() -> FieldSpec {
    FieldSpec::integer(SYSTOLIC_BP, "Pressão arterial sistólica (mmHg)")
        .between(0.0, 250.0)
        .unassessed()
}

pub fn temperature() -> FieldSpec {
    FieldSpec::number(TEMPERATURE, "Temperatura axilar (°C)")
        .between(30.0, 45.0)
        .unassessed()
}

pub fn glucose() -> FieldSpec {
    FieldSpec::number(GLUCOSE, "Glicemia (mg/dL)").between(0.0, 2000.0)
}

pub fn glasgow() -> FieldSpec {
    FieldSpec::integer(GLASGOW, "Escala de coma de Glasgow").between(3.0, 15.0)
}

/// Respiratory rate above the WHO fast-breathing cut-off for the age:
/// 60 under 2 months, 50 up to 11 months, 40 up to 4 years, 30 afterwards.
pub fn tachypnea() -> Predicate {
    any(vec![
        all(vec![
            below(AGE_MONTHS, 2.0),
            at_least(RESPIRATORY_RATE, 60.0),
        ]),
        all(vec![
            at_least(AGE_MONTHS, 2.0),
            below(AGE_MONTHS, 12.0),
            at_least(RESPIRATORY_RATE, 50.0),
        ]),
        all(vec![
            at_least(AGE_MONTHS, 12.0),
            below(AGE_MONTHS, 60.0),
            at_least(RESPIRATORY_RATE, 40.0),
        ]),
        all(vec![
            at_least(AGE_MONTHS, 60.0),
            at_least(RESPIRATORY_RATE, 30.0),
        ]),
    ])
}

/// Heart rate above the pediatric sepsis cut-off for the age group.
pub fn tachycardia() -> Predicate {
    any(vec![
        all(vec![below(AGE_MONTHS, 12.0), above(HEART_RATE, 180.0)]),
        all(vec![
            at_least(AGE_MONTHS, 12.0),
            below(AGE_MONTHS, 72.0),
            above(HEART_RATE, 140.0),
        ]),
        all(vec![
            at_least(AGE_MONTHS, 72.0),
            below(AGE_MONTHS, 156.0),
            above(HEART_RATE, 130.0),
        ]),
        all(vec![at_least(AGE_MONTHS, 156.0), above(HEART_RATE, 110.0)]),
    ])
}

/// Paracetamol drops, 200 mg/mL.
pub fn paracetamol() -> MedicationRule {
    MedicationRule::new(
        "Paracetamol",
        DoseFormula::per_kg(15.0).capped(750.0),
        DoseUnit::Mg,
        "VO",
    )
    .frequency("a cada 6 horas, se necessário")
    .concentration(200.0, 1.0)
    .rounding(Rounding::Decimals { places: 0 })
}

/// Ibuprofen suspension, 100 mg/5 mL. Not for infants under 6 months.
pub fn ibuprofen() -> MedicationRule {
    MedicationRule::new(
        "Ibuprofeno",
        DoseFormula::per_kg(10.0).capped(400.0),
        DoseUnit::Mg,
        "VO",
    )
    .frequency("a cada 6 a 8 horas, se necessário")
    .concentration(100.0, 5.0)
    .rounding(Rounding::Decimals { places: 0 })
    .when(at_least(AGE_MONTHS, 6.0))
}

/// Dipyrone, 500 mg/mL.
pub fn dipyrone() -> MedicationRule {
    MedicationRule::new(
        "Dipirona",
        DoseFormula::per_kg(20.0).capped(1000.0),
        DoseUnit::Mg,
        "IV ou VO",
    )
    .frequency("a cada 6 horas, se necessário")
    .concentration(500.0, 1.0)
    .rounding(Rounding::Decimals { places: 0 })
    .when(at_least(AGE_MONTHS, 3.0))
}

/// 10% dextrose bolus, 2 mL/kg (0.2 g/kg).
pub fn dextrose_bolus() -> MedicationRule {
    MedicationRule::new(
        "Glicose 10% (bolus)",
        DoseFormula::per_kg(2.0).capped(250.0),
        DoseUnit::Ml,
        "IV ou IO",
    )
    .frequency("em 5 a 10 minutos; repetir se glicemia persistir baixa")
    .rounding(Rounding::Decimals { places: 0 })
}

/// 0.9% saline bolus of `ml_per_kg`, capped at one litre.
pub fn saline_bolus(name: &str, ml_per_kg: f64) -> MedicationRule {
    MedicationRule::new(
        name,
        DoseFormula::per_kg(ml_per_kg).capped(1000.0),
        DoseUnit::Ml,
        "IV ou IO",
    )
    .rounding(Rounding::Decimals { places: 0 })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pedi_core::models::params::{FieldValue, PatientParameters};

    use super::*;
    use crate::predicate::EvalContext;

    fn patient(age_months: f64, field: &str, value: f64) -> PatientParameters {
        let values = BTreeMap::from([(field.to_string(), FieldValue::Number(value))]);
        PatientParameters::new(10.0, age_months, values)
    }

    #[test]
    fn tachypnea_cut_off_depends_on_age() {
        let infant = patient(1.0, RESPIRATORY_RATE, 58.0);
        assert!(!tachypnea().evaluate(&EvalContext::new(&infant)));

        let toddler = patient(24.0, RESPIRATORY_RATE, 42.0);
        assert!(tachypnea().evaluate(&EvalContext::new(&toddler)));

        let school_age = patient(96.0, RESPIRATORY_RATE, 30.0);
        assert!(tachypnea().evaluate(&EvalContext::new(&school_age)));
    }

    #[test]
    fn tachycardia_is_strict() {
        let infant = patient(6.0, HEART_RATE, 180.0);
        assert!(!tachycardia().evaluate(&EvalContext::new(&infant)));

        let infant = patient(6.0, HEART_RATE, 181.0);
        assert!(tachycardia().evaluate(&EvalContext::new(&infant)));
    }

    #[test]
    fn patient_fields_come_first() {
        let fields = patient_fields(vec![temperature()]);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, [WEIGHT, AGE, AGE_UNIT, TEMPERATURE]);
    }
}
