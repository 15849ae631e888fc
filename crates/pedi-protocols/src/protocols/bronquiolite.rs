//! Acute viral bronchiolitis in infants.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, RESPIRATORY_RATE, SPO2};
use crate::definition::{
    ClassificationRules, ConditionalBlock, Criterion, FieldSpec, LevelBlock, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, Threshold, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{all, any, at_least, below, eq, is, level_at_least, level_is};

const RETRACTIONS: &str = "retractions";
const FEEDING: &str = "feeding";
const APNEA: &str = "apnea";
const LETHARGY: &str = "lethargy";
const DEHYDRATION: &str = "dehydration";
const PREMATURITY: &str = "prematurity";
const HEART_DISEASE: &str = "heartDisease";
const CHRONIC_LUNG_DISEASE: &str = "chronicLungDisease";
const IMMUNODEFICIENCY: &str = "immunodeficiency";

pub fn definition() -> ProtocolDefinition {
    let risk_factors = any(vec![
        is(PREMATURITY),
        is(HEART_DISEASE),
        is(CHRONIC_LUNG_DISEASE),
        is(IMMUNODEFICIENCY),
    ]);

    ProtocolDefinition {
        id: "bronquiolite".to_string(),
        name: "Bronquiolite viral aguda".to_string(),
        description: "Avaliação da gravidade da bronquiolite em lactentes e suporte clínico."
            .to_string(),
        fields: common::patient_fields(vec![
            common::oxygen_saturation(),
            common::respiratory_rate(),
            FieldSpec::choice(
                RETRACTIONS,
                "Tiragem",
                &["ausente", "leve", "moderada", "grave"],
            )
            .defaults_to_option("ausente"),
            FieldSpec::choice(FEEDING, "Aceitação alimentar", &["normal", "reduzida", "recusa"])
                .defaults_to_option("normal"),
            FieldSpec::flag(APNEA, "Episódios de apneia"),
            FieldSpec::flag(LETHARGY, "Letargia"),
            FieldSpec::flag(DEHYDRATION, "Sinais de desidratação"),
            FieldSpec::flag(PREMATURITY, "Prematuridade (< 35 semanas)"),
            FieldSpec::flag(HEART_DISEASE, "Cardiopatia congênita com repercussão"),
            FieldSpec::flag(CHRONIC_LUNG_DISEASE, "Doença pulmonar crônica"),
            FieldSpec::flag(IMMUNODEFICIENCY, "Imunodeficiência"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("leve", "Bronquiolite leve"),
                ("moderada", "Bronquiolite moderada"),
                ("grave", "Bronquiolite grave"),
            ]),
            overrides: vec![
                Override::new("Apneia", is(APNEA)),
                Override::new("Letargia", is(LETHARGY)),
                Override::new("SpO₂ < 90%", below(SPO2, 90.0)),
            ],
            strategy: Strategy::Scored {
                criteria: vec![
                    Criterion::new(
                        "SpO₂ entre 90% e 91%",
                        all(vec![at_least(SPO2, 90.0), below(SPO2, 92.0)]),
                        2.0,
                    ),
                    Criterion::new(
                        "FR entre 50 e 59 irpm",
                        all(vec![
                            at_least(RESPIRATORY_RATE, 50.0),
                            below(RESPIRATORY_RATE, 60.0),
                        ]),
                        1.0,
                    ),
                    Criterion::new("FR ≥ 60 irpm", at_least(RESPIRATORY_RATE, 60.0), 2.0),
                    Criterion::new("Tiragem leve", eq(RETRACTIONS, "leve"), 1.0),
                    Criterion::new("Tiragem moderada", eq(RETRACTIONS, "moderada"), 2.0),
                    Criterion::new("Tiragem grave", eq(RETRACTIONS, "grave"), 3.0),
                    Criterion::new("Aceitação alimentar reduzida", eq(FEEDING, "reduzida"), 1.0),
                    Criterion::new("Recusa alimentar", eq(FEEDING, "recusa"), 2.0),
                    Criterion::new("Desidratação", is(DEHYDRATION), 1.0),
                ],
                thresholds: vec![
                    Threshold::new(0.0, "leve"),
                    Threshold::new(3.0, "moderada"),
                    Threshold::new(6.0, "grave"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Hidratação venosa de manutenção (Holliday-Segar)",
                DoseFormula::holliday_segar().divided(24),
                DoseUnit::MlPerHour,
                "IV",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(any(vec![
                eq(FEEDING, "recusa"),
                is(DEHYDRATION),
                level_is("grave"),
            ]))
            .note("Solução isotônica; considerar sonda nasogástrica como alternativa"),
            MedicationRule::new(
                "Solução salina hipertônica 3%",
                DoseFormula::fixed(4.0),
                DoseUnit::Ml,
                "nebulização",
            )
            .frequency("a cada 8 horas")
            .when(level_at_least("moderada"))
            .note("Apenas para pacientes internados"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Lavagem nasal com soro fisiológico e aspiração superficial",
                "Manter cabeceira elevada",
                "Oxigênio se SpO₂ persistentemente < 90%",
                "Não usar broncodilatador, corticoide ou antibiótico de rotina",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "leve",
                    &[
                        "Tratamento domiciliar com fracionamento das mamadas",
                        "Orientar sinais de alarme: pausas respiratórias, gemência, recusa alimentar",
                    ],
                ),
                LevelBlock::new(
                    "moderada",
                    &[
                        "Observação hospitalar com monitorização de SpO₂",
                        "Avaliar necessidade de hidratação por sonda ou venosa",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Oxigenoterapia e considerar cânula nasal de alto fluxo",
                        "Jejum e hidratação venosa",
                        "Avaliar necessidade de suporte ventilatório",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    risk_factors.clone(),
                    &["Fator de risco para evolução grave: reavaliação frequente"],
                ),
                ConditionalBlock::new(
                    below(AGE_MONTHS, 3.0),
                    &["Lactente menor de 3 meses: risco de apneia, preferir observação hospitalar"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Bronquiolite moderada ou grave", level_at_least("moderada")),
            Reason::new("Apneia", is(APNEA)),
            Reason::new("Idade menor que 3 meses", below(AGE_MONTHS, 3.0)),
            Reason::new("Recusa alimentar", eq(FEEDING, "recusa")),
            Reason::new(
                "Fatores de risco (prematuridade, cardiopatia, pneumopatia ou imunodeficiência)",
                risk_factors,
            ),
        ],
        icu: Some(vec![
            Reason::new("Apneia recorrente", is(APNEA)),
            Reason::new("Bronquiolite grave", level_is("grave")),
        ]),
        discharge_criteria: texts(&[
            "SpO₂ ≥ 90% em ar ambiente",
            "Aceitação alimentar de pelo menos 50% do habitual",
            "Ausência de desconforto respiratório moderado",
            "Cuidadores orientados quanto aos sinais de alarme",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn score_sums_to_moderate() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 7, "age": 6, "ageUnit": "meses",
                "oxygenSaturation": 91, "respiratoryRate": 55, "retractions": "moderada"
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("moderada"));
        assert_eq!(result.classification.score, Some(5.0));
        assert_eq!(result.classification.contributing_criteria.len(), 3);
        assert!(result.dose("Solução salina hipertônica 3%").is_some());
        assert!(result.dose("Hidratação venosa de manutenção (Holliday-Segar)").is_none());
        assert!(result.hospitalization.indicated);
        assert!(result.discharge_criteria.is_empty());
    }

    #[test]
    fn apnea_forces_severe_and_icu() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 7, "age": 6, "ageUnit": "meses", "apnea": true }),
        )
        .unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("grave"));
        assert!(result.classification.overridden);
        assert_eq!(result.classification.score, Some(0.0));
        let fluids = result
            .dose("Hidratação venosa de manutenção (Holliday-Segar)")
            .unwrap();
        assert_eq!(fluids.amount, 29.0);
        let icu = result.icu_indication.as_ref().unwrap();
        assert_eq!(icu.reasons, ["Apneia recorrente", "Bronquiolite grave"]);
    }

    #[test]
    fn mild_infant_goes_home() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 8, "age": 8, "ageUnit": "meses", "oxygenSaturation": 96 }),
        )
        .unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("leve"));
        assert!(result.doses.is_empty());
        assert!(!result.hospitalization.indicated);
        assert!(!result.discharge_criteria.is_empty());
    }

    #[test]
    fn young_infant_is_admitted_even_when_mild() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 4, "age": 2, "ageUnit": "meses" }),
        )
        .unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("leve"));
        assert_eq!(result.hospitalization.reasons, ["Idade menor que 3 meses"]);
    }
}
