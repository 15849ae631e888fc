use jiff::Timestamp;
use serde_json::json;

use pedi_core::models::result::CalculationResult;
use pedi_export::docx::generate_docx;
use pedi_export::error::ExportError;
use pedi_export::render::{render_default, render_result};
use pedi_export::styles::DocumentStyles;
use pedi_protocols::Registry;

fn compute(protocol_id: &str, raw: serde_json::Value) -> CalculationResult {
    let registry = Registry::builtin().unwrap();
    let outcome = registry.calculate(protocol_id, &raw).unwrap();
    outcome.result().unwrap().clone()
}

fn stamp() -> Timestamp {
    Timestamp::from_second(1_760_000_000).unwrap()
}

#[test]
fn default_summary_lists_level_and_doses() {
    let result = compute(
        "anafilaxia",
        json!({
            "weight": 40, "age": 12, "allergenExposure": true,
            "urticaria": true, "dyspnea": true
        }),
    );
    let text = render_default(&result, stamp()).unwrap();

    assert!(text.starts_with("# Anafilaxia\n"));
    assert!(text.contains("**Classificação:** Anafilaxia"));
    assert!(text.contains("- Adrenalina IM: 0.3 mg"));
    assert!(text.contains("**(dose máxima)**"));
    assert!(text.contains("## Internação"));
    assert!(text.contains("Gerado em 09/10/2025 08:53 UTC."));
}

#[test]
fn score_and_override_are_shown() {
    let result = compute(
        "asma",
        json!({ "weight": 25, "age": 8, "oxygenSaturation": 87, "wheezing": "silencio" }),
    );
    let text = render_default(&result, stamp()).unwrap();
    assert!(text.contains("(escore 6)"));
    assert!(text.contains("> Nível definido por sinal de perigo"));
    assert!(text.contains("## UTI"));
    assert!(!text.contains("## Critérios de alta"));
}

#[test]
fn discharge_criteria_only_without_hospitalization() {
    let result = compute("pneumonia", json!({ "weight": 12, "age": 3 }));
    assert!(!result.hospitalization.indicated);
    let text = render_default(&result, stamp()).unwrap();
    assert!(text.contains("- Não indicada"));
    assert!(text.contains("## Critérios de alta"));
}

#[test]
fn custom_template_sees_result_fields() {
    let result = compute("pneumonia", json!({ "weight": 5, "age": 4, "ageUnit": "meses" }));
    let template = "{{ protocol_id }}: {{ classification.level.id }}\n\
                    {% for dose in dose_lines %}{{ dose.text }}\n{% endfor %}";
    let text = render_result("curto.txt", template, &result).unwrap();
    assert!(text.starts_with("pneumonia: pneumonia\n"));
    assert!(text.contains("Amoxicilina: 83.3 mg VO (1.7 mL de 250 mg/5 mL)"));
}

#[test]
fn broken_template_is_a_parse_error() {
    let result = compute("pneumonia", json!({ "weight": 12, "age": 3 }));
    let err = render_result("quebrado.txt", "{% if %}", &result).unwrap_err();
    assert!(matches!(err, ExportError::TemplateParse(_)));
}

#[test]
fn docx_is_a_zip_package() {
    let result = compute(
        "crupe",
        json!({ "weight": 14, "age": 3, "stridor": "repouso", "retractions": "moderada" }),
    );
    let text = render_default(&result, stamp()).unwrap();
    let bytes = generate_docx(&text, &DocumentStyles::default()).unwrap();
    assert!(bytes.len() > 1000);
    assert_eq!(&bytes[..2], b"PK");
}
