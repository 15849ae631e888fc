use serde_json::json;

use pedi_core::models::result::CalculationOutcome;
use pedi_core::models::validation::ValidationCode;
use pedi_protocols::Registry;
use pedi_protocols::error::ProtocolError;
use pedi_protocols::protocols::{anafilaxia, asma, pneumonia};

fn registry() -> Registry {
    Registry::builtin().unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn adrenaline_scales_with_weight() {
    let registry = registry();
    let outcome = registry
        .calculate(
            "anafilaxia",
            &json!({
                "weight": 20, "age": 6, "allergenExposure": true,
                "urticaria": true, "dyspnea": true
            }),
        )
        .unwrap();
    let result = outcome.result().unwrap();
    assert!(result.classification.is_level("anafilaxia"));

    let dose = result.dose(anafilaxia::ADRENALINE).unwrap();
    assert!(approx(dose.amount, 0.2));
    assert!(!dose.capped);
    assert!(approx(dose.volume.as_ref().unwrap().ml, 0.2));
}

#[test]
fn adrenaline_is_capped_for_heavier_children() {
    let outcome = registry()
        .calculate(
            "anafilaxia",
            &json!({
                "weight": 40, "age": 12, "allergenExposure": true,
                "urticaria": true, "bronchospasm": true
            }),
        )
        .unwrap();
    let dose = outcome.result().unwrap().dose(anafilaxia::ADRENALINE).unwrap().clone();
    assert!(approx(dose.amount, 0.3));
    assert!(dose.capped);
}

#[test]
fn silent_chest_overrides_the_score() {
    let outcome = registry()
        .calculate(
            "asma",
            &json!({ "weight": 25, "age": 8, "oxygenSaturation": 87, "wheezing": "silencio" }),
        )
        .unwrap();
    let result = outcome.result().unwrap();
    assert!(result.classification.is_level(asma::MOST_SEVERE));
    assert!(result.classification.overridden);
    assert!(result.classification.score.is_some());
    assert!(result.hospitalization.indicated);
    assert!(result.icu_indication.as_ref().is_some_and(|icu| icu.indicated));
    assert!(result.discharge_criteria.is_empty());
}

#[test]
fn saturation_boundaries_are_strict_below_ninety() {
    let registry = registry();
    let level = |spo2: u32| {
        let outcome = registry
            .calculate(
                "asma",
                &json!({
                    "weight": 25, "age": 8, "oxygenSaturation": spo2, "wheezing": "ausente"
                }),
            )
            .unwrap();
        outcome.result().unwrap().classification.level.id.clone()
    };
    assert_eq!(level(89), "grave");
    assert_eq!(level(90), "leve");
    assert_eq!(level(91), "leve");
}

#[test]
fn saturation_accepts_the_whole_percentage_range() {
    let registry = registry();
    let classify = |spo2: u32| {
        registry
            .calculate(
                "asma",
                &json!({
                    "weight": 20, "age": 6, "oxygenSaturation": spo2, "wheezing": "ausente"
                }),
            )
            .unwrap()
    };
    for spo2 in [0, 45, 49] {
        let outcome = classify(spo2);
        assert!(outcome.errors().is_empty(), "SpO₂ {spo2} rejected");
        assert_eq!(outcome.result().unwrap().classification.level.id, "grave");
    }

    let outcome = classify(101);
    let errors = outcome.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "oxygenSaturation");
    assert_eq!(errors[0].code, ValidationCode::OutOfRange);
}

#[test]
fn zero_weight_is_rejected_with_one_error() {
    let outcome = registry()
        .calculate("asma", &json!({ "weight": 0, "age": 8, "wheezing": "ausente" }))
        .unwrap();
    let errors = outcome.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "weight");
    assert_eq!(errors[0].code, ValidationCode::OutOfRange);
}

#[test]
fn every_invalid_field_is_reported() {
    let outcome = registry()
        .calculate(
            "asma",
            &json!({
                "weight": "vinte", "age": -1, "wheezing": "alto", "bogus": true
            }),
        )
        .unwrap();
    let errors = outcome.errors();
    assert_eq!(errors.len(), 4);

    let code = |field: &str| errors.iter().find(|e| e.field == field).map(|e| e.code);
    assert_eq!(code("weight"), Some(ValidationCode::NotANumber));
    assert_eq!(code("age"), Some(ValidationCode::OutOfRange));
    assert_eq!(code("wheezing"), Some(ValidationCode::UnknownOption));
    assert_eq!(code("bogus"), Some(ValidationCode::UnknownField));
}

#[test]
fn amoxicillin_for_a_young_infant() {
    let outcome = registry()
        .calculate("pneumonia", &json!({ "weight": 5, "age": 4, "ageUnit": "meses" }))
        .unwrap();
    let result = outcome.result().unwrap();
    assert!(result.classification.is_level("pneumonia"));

    let dose = result.dose(pneumonia::AMOXICILLIN).unwrap();
    assert!(approx(dose.amount, 83.3));
    assert!(approx(dose.volume.as_ref().unwrap().ml, 1.7));
}

#[test]
fn identical_input_gives_identical_output() {
    let registry = registry();
    let input = json!({
        "weight": 18, "age": 5, "oxygenSaturation": 93, "wheezing": "inspiratoria_expiratoria",
        "speech": "frases_curtas", "respiratoryRate": 44
    });
    let first = registry.calculate("asma", &input).unwrap();
    let second = registry.calculate("asma", &input).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn outcome_serializes_with_ok_flag() {
    let registry = registry();
    let computed = registry
        .calculate("pneumonia", &json!({ "weight": 12, "age": 3 }))
        .unwrap();
    let value = serde_json::to_value(&computed).unwrap();
    assert_eq!(value["ok"], true);
    assert_eq!(value["result"]["protocol_id"], "pneumonia");

    let rejected = registry.calculate("pneumonia", &json!([])).unwrap();
    assert!(matches!(rejected, CalculationOutcome::Rejected(_)));
    let value = serde_json::to_value(&rejected).unwrap();
    assert_eq!(value["ok"], false);
    assert!(value["errors"].as_array().is_some_and(|e| !e.is_empty()));
}

#[test]
fn unknown_protocol_is_an_error() {
    let err = registry()
        .calculate("varicela", &json!({ "weight": 10, "age": 2 }))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownProtocol(id) if id == "varicela"));
}

#[test]
fn every_builtin_protocol_accepts_a_minimal_patient() {
    let registry = registry();
    for protocol in registry.protocols() {
        let outcome = registry
            .calculate(&protocol.id, &json!({ "weight": 20, "age": 6 }))
            .unwrap();
        // Protocols with required clinical fields reject; none may fail.
        assert!(outcome.errors().iter().all(|e| e.code == ValidationCode::Missing));
    }
}
