//! Acute pharyngotonsillitis: McIsaac score for group A streptococcus and
//! antibiotic choice.
//!
//! No ICU statement.

use pedi_core::models::params::AGE_YEARS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common;
use crate::definition::{
    ClassificationRules, ConditionalBlock, Criterion, FieldSpec, LevelBlock, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, Threshold, levels, texts,
};
use crate::formula::{DoseFormula, WeightBand};
use crate::predicate::{Predicate, all, any, at_least, below, eq, is, level_is, not};

const FEVER: &str = "fever";
const NO_COUGH: &str = "noCough";
const TONSILLAR_EXUDATE: &str = "tonsillarExudate";
const TENDER_NODES: &str = "tenderAnteriorNodes";
const RAPID_TEST: &str = "rapidStrepTest";
const PENICILLIN_ALLERGY: &str = "penicillinAllergy";
const PERITONSILLAR_ABSCESS: &str = "peritonsillarAbscessSigns";
const POOR_ORAL_INTAKE: &str = "poorOralIntake";

fn treat() -> Predicate {
    any(vec![
        eq(RAPID_TEST, "positivo"),
        all(vec![level_is("alto_risco"), eq(RAPID_TEST, "nao_realizado")]),
    ])
}

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "faringoamigdalite".to_string(),
        name: "Faringoamigdalite aguda".to_string(),
        description: "Escore de McIsaac para faringoamigdalite estreptocócica e tratamento \
                      antibiótico."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::flag(FEVER, "Temperatura > 38 °C"),
            FieldSpec::flag(NO_COUGH, "Ausência de tosse"),
            FieldSpec::flag(TONSILLAR_EXUDATE, "Exsudato ou edema amigdaliano"),
            FieldSpec::flag(TENDER_NODES, "Linfonodomegalia cervical anterior dolorosa"),
            FieldSpec::choice(
                RAPID_TEST,
                "Teste rápido para estreptococo",
                &["nao_realizado", "positivo", "negativo"],
            )
            .defaults_to_option("nao_realizado"),
            FieldSpec::flag(PENICILLIN_ALLERGY, "Alergia a penicilina"),
            FieldSpec::flag(PERITONSILLAR_ABSCESS, "Trismo, voz abafada ou desvio da úvula"),
            FieldSpec::flag(POOR_ORAL_INTAKE, "Incapaz de ingerir líquidos"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("baixo_risco", "Baixo risco de etiologia estreptocócica (0 a 1)"),
                ("risco_intermediario", "Risco intermediário (2 a 3)"),
                ("alto_risco", "Alto risco (4 ou mais)"),
            ]),
            overrides: vec![],
            strategy: Strategy::Scored {
                criteria: vec![
                    Criterion::new("Febre", is(FEVER), 1.0),
                    Criterion::new("Ausência de tosse", is(NO_COUGH), 1.0),
                    Criterion::new("Exsudato amigdaliano", is(TONSILLAR_EXUDATE), 1.0),
                    Criterion::new("Adenomegalia cervical dolorosa", is(TENDER_NODES), 1.0),
                    Criterion::new(
                        "Idade entre 3 e 14 anos",
                        all(vec![at_least(AGE_YEARS, 3.0), below(AGE_YEARS, 15.0)]),
                        1.0,
                    ),
                ],
                thresholds: vec![
                    Threshold::new(0.0, "baixo_risco"),
                    Threshold::new(2.0, "risco_intermediario"),
                    Threshold::new(4.0, "alto_risco"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Amoxicilina",
                DoseFormula::per_kg(50.0).capped(1000.0).divided(2),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 12 horas por 10 dias")
            .concentration(250.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![treat(), not(is(PENICILLIN_ALLERGY))])),
            MedicationRule::new(
                "Penicilina G benzatina",
                DoseFormula::bands(vec![
                    WeightBand::below(27.0, 600_000.0),
                    WeightBand::rest(1_200_000.0),
                ]),
                DoseUnit::Ui,
                "IM",
            )
            .frequency("dose única")
            .rounding(Rounding::Exact)
            .when(all(vec![treat(), not(is(PENICILLIN_ALLERGY))]))
            .note("Alternativa à amoxicilina quando a adesão é incerta"),
            MedicationRule::new(
                "Azitromicina",
                DoseFormula::per_kg(12.0).capped(500.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia por 5 dias")
            .concentration(200.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![treat(), is(PENICILLIN_ALLERGY)])),
            common::ibuprofen(),
        ],
        recommendations: RecommendationRules {
            general: texts(&["Analgesia e hidratação"]),
            by_level: vec![
                LevelBlock::new(
                    "baixo_risco",
                    &["Provável etiologia viral: não usar antibiótico nem testar"],
                ),
                LevelBlock::new(
                    "risco_intermediario",
                    &["Realizar teste rápido ou cultura; tratar apenas se positivo"],
                ),
                LevelBlock::new(
                    "alto_risco",
                    &["Teste rápido se disponível; na indisponibilidade, tratamento empírico"],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    eq(RAPID_TEST, "negativo"),
                    &["Teste rápido negativo: cultura de orofaringe se alta suspeita clínica"],
                ),
                ConditionalBlock::new(
                    is(PERITONSILLAR_ABSCESS),
                    &["Suspeita de abscesso periamigdaliano: avaliação otorrinolaringológica"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Suspeita de abscesso periamigdaliano", is(PERITONSILLAR_ABSCESS)),
            Reason::new("Incapaz de ingerir líquidos", is(POOR_ORAL_INTAKE)),
        ],
        icu: None,
        discharge_criteria: texts(&[
            "Aceitando líquidos",
            "Retorno se febre persistir por mais de 48 a 72 horas após o antibiótico",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn high_score_without_test_is_treated_empirically() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 30, "age": 8, "fever": true, "noCough": true,
                "tonsillarExudate": true
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.classification.score, Some(4.0));
        assert_eq!(result.dose("Amoxicilina").unwrap().amount, 500.0);
        assert!(result.dose("Amoxicilina").unwrap().capped);
        assert_eq!(result.dose("Penicilina G benzatina").unwrap().amount, 1_200_000.0);
    }

    #[test]
    fn negative_test_means_no_antibiotic() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 30, "age": 8, "fever": true, "noCough": true,
                "tonsillarExudate": true, "rapidStrepTest": "negativo"
            }),
        )
        .unwrap();
        assert!(outcome.result().unwrap().dose("Amoxicilina").is_none());
    }
}
