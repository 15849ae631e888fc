//! Input validation: raw JSON parameters to [`PatientParameters`].
//!
//! Every declared constraint is applied and every violation collected, one
//! error per offending field.

use std::collections::BTreeMap;

use serde_json::Value;

use pedi_core::models::params::{FieldValue, PatientParameters};
use pedi_core::models::validation::{ValidationCode, ValidationError};

use crate::definition::{Bound, FieldKind, FieldSpec, Presence, ProtocolDefinition};

pub const WEIGHT: &str = "weight";
pub const AGE: &str = "age";
pub const AGE_UNIT: &str = "ageUnit";
pub const AGE_UNIT_YEARS: &str = "anos";
pub const AGE_UNIT_MONTHS: &str = "meses";
pub const AGE_UNIT_OPTIONS: [&str; 2] = [AGE_UNIT_YEARS, AGE_UNIT_MONTHS];

/// Oldest patient the pediatric protocols accept, in months.
pub const MAX_AGE_MONTHS: f64 = 18.0 * 12.0;

pub fn validate(
    protocol: &ProtocolDefinition,
    raw: &Value,
) -> Result<PatientParameters, Vec<ValidationError>> {
    let Some(object) = raw.as_object() else {
        return Err(vec![ValidationError::new(
            "",
            ValidationCode::NotAnObject,
            "os parâmetros devem ser um objeto",
        )]);
    };

    let mut errors = Vec::new();
    for (key, value) in object {
        if !value.is_null() && protocol.field(key).is_none() {
            errors.push(ValidationError::new(
                key.as_str(),
                ValidationCode::UnknownField,
                format!("campo desconhecido para o protocolo {}", protocol.name),
            ));
        }
    }

    let mut values = BTreeMap::new();
    for spec in &protocol.fields {
        match object.get(&spec.name).filter(|v| !v.is_null()) {
            Some(raw_value) => match coerce(spec, raw_value) {
                Ok(value) => {
                    values.insert(spec.name.clone(), value);
                }
                Err(error) => errors.push(error),
            },
            None => match &spec.presence {
                Presence::Required => errors.push(ValidationError::new(
                    spec.name.as_str(),
                    ValidationCode::Missing,
                    format!("{} é obrigatório", spec.label),
                )),
                Presence::Default(value) => {
                    values.insert(spec.name.clone(), value.clone());
                }
                Presence::Unassessed => {}
            },
        }
    }

    let weight_kg = values.get(WEIGHT).and_then(FieldValue::as_number);
    let age_months = match (
        values.get(AGE).and_then(FieldValue::as_number),
        values.get(AGE_UNIT).and_then(FieldValue::as_text),
    ) {
        (Some(age), Some(AGE_UNIT_MONTHS)) => Some(age),
        (Some(age), Some(_)) => Some(age * 12.0),
        _ => None,
    };
    if let Some(months) = age_months
        && months > MAX_AGE_MONTHS
    {
        errors.push(ValidationError::new(
            AGE,
            ValidationCode::OutOfRange,
            "a idade deve ser de no máximo 18 anos",
        ));
    }

    match (weight_kg, age_months) {
        (Some(weight_kg), Some(age_months)) if errors.is_empty() => {
            Ok(PatientParameters::new(weight_kg, age_months, values))
        }
        _ => Err(errors),
    }
}

fn coerce(spec: &FieldSpec, raw: &Value) -> Result<FieldValue, ValidationError> {
    match &spec.kind {
        FieldKind::Number { min, max, integer } => {
            let n = parse_number(raw).ok_or_else(|| {
                ValidationError::new(
                    spec.name.as_str(),
                    ValidationCode::NotANumber,
                    format!("{} deve ser um número", spec.label),
                )
            })?;
            if *integer && n.fract() != 0.0 {
                return Err(ValidationError::new(
                    spec.name.as_str(),
                    ValidationCode::NotAnInteger,
                    format!("{} deve ser um número inteiro", spec.label),
                ));
            }
            let in_range = min.is_none_or(|b| b.admits_above(n)) && max.is_none_or(|b| b.admits_below(n));
            if !in_range {
                return Err(ValidationError::new(
                    spec.name.as_str(),
                    ValidationCode::OutOfRange,
                    format!("{} {}", spec.label, describe_range(*min, *max)),
                ));
            }
            Ok(FieldValue::Number(n))
        }
        FieldKind::Boolean => parse_bool(raw).map(FieldValue::Bool).ok_or_else(|| {
            ValidationError::new(
                spec.name.as_str(),
                ValidationCode::NotABoolean,
                format!("{} deve ser sim ou não", spec.label),
            )
        }),
        FieldKind::Choice { options } => {
            let chosen = raw
                .as_str()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| options.contains(s));
            chosen.map(FieldValue::Text).ok_or_else(|| {
                ValidationError::new(
                    spec.name.as_str(),
                    ValidationCode::UnknownOption,
                    format!("{} deve ser um de: {}", spec.label, options.join(", ")),
                )
            })
        }
    }
}

fn parse_number(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "sim" => Some(true),
            "false" | "nao" | "não" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn describe_range(min: Option<Bound>, max: Option<Bound>) -> String {
    let lower = min.map(|b| {
        if b.inclusive {
            format!("maior ou igual a {}", b.value)
        } else {
            format!("maior que {}", b.value)
        }
    });
    let upper = max.map(|b| {
        if b.inclusive {
            format!("menor ou igual a {}", b.value)
        } else {
            format!("menor que {}", b.value)
        }
    });
    match (lower, upper) {
        (Some(l), Some(u)) => format!("deve ser {l} e {u}"),
        (Some(l), None) => format!("deve ser {l}"),
        (None, Some(u)) => format!("deve ser {u}"),
        (None, None) => "está fora do intervalo".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::definition::{ClassificationRules, LevelBlock, RecommendationRules, Strategy, levels};
    use crate::definition::LevelRule;

    fn protocol() -> ProtocolDefinition {
        ProtocolDefinition {
            id: "teste".to_string(),
            name: "Teste".to_string(),
            description: String::new(),
            fields: vec![
                FieldSpec::number(WEIGHT, "Peso (kg)").above_up_to(0.0, 150.0),
                FieldSpec::number(AGE, "Idade").at_least(0.0),
                FieldSpec::choice(AGE_UNIT, "Unidade da idade", &AGE_UNIT_OPTIONS)
                    .defaults_to_option(AGE_UNIT_YEARS),
                FieldSpec::number("saturacao", "SpO₂ (%)").between(0.0, 100.0).unassessed(),
                FieldSpec::integer("glasgow", "Glasgow").between(3.0, 15.0).unassessed(),
                FieldSpec::flag("febre", "Febre"),
                FieldSpec::choice("sibilancia", "Sibilância", &["ausente", "silencio"])
                    .defaults_to_option("ausente"),
            ],
            classification: ClassificationRules {
                levels: levels(&[("leve", "Leve")]),
                overrides: vec![],
                strategy: Strategy::Direct {
                    rules: vec![LevelRule::otherwise("sempre", "leve")],
                },
            },
            medications: vec![],
            recommendations: RecommendationRules {
                general: vec![],
                by_level: vec![LevelBlock::new("leve", &[])],
                conditional: vec![],
            },
            hospitalization: vec![],
            icu: None,
            discharge_criteria: vec![],
        }
    }

    #[test]
    fn applies_defaults_and_leaves_unassessed_fields_absent() {
        let params = validate(&protocol(), &json!({ "weight": 20, "age": 5 })).unwrap();
        assert_eq!(params.weight_kg, 20.0);
        assert_eq!(params.age_months, 60.0);
        assert_eq!(params.flag("febre"), Some(false));
        assert_eq!(params.text("sibilancia"), Some("ausente"));
        assert_eq!(params.number("saturacao"), None);
    }

    #[test]
    fn zero_weight_is_rejected() {
        let errors = validate(&protocol(), &json!({ "weight": 0, "age": 5 })).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "weight");
        assert_eq!(errors[0].code, ValidationCode::OutOfRange);
    }

    #[test]
    fn collects_one_error_per_invalid_field() {
        let errors = validate(
            &protocol(),
            &json!({
                "weight": -3,
                "age": "abc",
                "saturacao": 101,
                "glasgow": 12.5,
                "febre": "talvez",
                "sibilancia": "forte",
                "desconhecido": true
            }),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 7);
        let codes: Vec<_> = errors.iter().map(|e| (e.field.as_str(), e.code)).collect();
        assert!(codes.contains(&("desconhecido", ValidationCode::UnknownField)));
        assert!(codes.contains(&("weight", ValidationCode::OutOfRange)));
        assert!(codes.contains(&("age", ValidationCode::NotANumber)));
        assert!(codes.contains(&("saturacao", ValidationCode::OutOfRange)));
        assert!(codes.contains(&("glasgow", ValidationCode::NotAnInteger)));
        assert!(codes.contains(&("febre", ValidationCode::NotABoolean)));
        assert!(codes.contains(&("sibilancia", ValidationCode::UnknownOption)));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let errors = validate(&protocol(), &json!({})).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["weight", "age"]);
        assert!(errors.iter().all(|e| e.code == ValidationCode::Missing));
    }

    #[test]
    fn coerces_strings_and_decimal_commas() {
        let params = validate(
            &protocol(),
            &json!({
                "weight": "12,5",
                "age": "18",
                "ageUnit": " Meses ",
                "febre": "sim",
                "sibilancia": "SILENCIO"
            }),
        )
        .unwrap();
        assert_eq!(params.weight_kg, 12.5);
        assert_eq!(params.age_months, 18.0);
        assert_eq!(params.flag("febre"), Some(true));
        assert_eq!(params.text("sibilancia"), Some("silencio"));
    }

    #[test]
    fn null_counts_as_absent() {
        let params = validate(
            &protocol(),
            &json!({ "weight": 10, "age": 1, "saturacao": null, "outro": null }),
        )
        .unwrap();
        assert_eq!(params.number("saturacao"), None);
    }

    #[test]
    fn age_above_eighteen_years_is_out_of_range() {
        let errors = validate(&protocol(), &json!({ "weight": 60, "age": 19 })).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "age");

        let months = validate(
            &protocol(),
            &json!({ "weight": 60, "age": 200, "ageUnit": "meses" }),
        );
        assert!(months.is_ok());
    }

    #[test]
    fn non_object_input_is_a_single_error() {
        let errors = validate(&protocol(), &json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::NotAnObject);
    }
}
