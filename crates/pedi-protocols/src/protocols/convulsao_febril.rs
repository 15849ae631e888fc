//! Febrile seizure: simple versus complex by duration, focality, recurrence
//! and age window.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, TEMPERATURE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{above, all, any, at_least, below, is, level_at_least, level_is};

const DURATION: &str = "durationMinutes";
const FOCAL: &str = "focal";
const RECURRED: &str = "recurredWithin24h";
const ONGOING: &str = "ongoingSeizure";
const MENINGEAL_SIGNS: &str = "meningealSigns";
const PROLONGED_POSTICTAL: &str = "prolongedPostictal";
const NEUROLOGIC_DISEASE: &str = "previousNeurologicDisease";
const RECENT_ANTIBIOTIC: &str = "recentAntibiotic";
const VACCINES_INCOMPLETE: &str = "vaccinesIncomplete";

pub fn definition() -> ProtocolDefinition {
    let meningitis_risk = any(vec![
        is(MENINGEAL_SIGNS),
        is(PROLONGED_POSTICTAL),
        all(vec![below(AGE_MONTHS, 12.0), is(VACCINES_INCOMPLETE)]),
        is(RECENT_ANTIBIOTIC),
    ]);
    let fever = at_least(TEMPERATURE, 37.8);

    ProtocolDefinition {
        id: "convulsao_febril".to_string(),
        name: "Convulsão febril".to_string(),
        description: "Diferencia crise febril simples de complexa e orienta investigação de \
                      infecção do sistema nervoso central."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::number(DURATION, "Duração da crise (minutos)").between(0.0, 600.0),
            FieldSpec::flag(FOCAL, "Crise focal"),
            FieldSpec::flag(RECURRED, "Recorrência em 24 horas"),
            FieldSpec::flag(ONGOING, "Crise em curso"),
            FieldSpec::flag(MENINGEAL_SIGNS, "Sinais meníngeos"),
            FieldSpec::flag(PROLONGED_POSTICTAL, "Pós-ictal prolongado (> 1 hora)"),
            FieldSpec::flag(NEUROLOGIC_DISEASE, "Doença neurológica prévia"),
            FieldSpec::flag(RECENT_ANTIBIOTIC, "Uso recente de antibiótico"),
            FieldSpec::flag(VACCINES_INCOMPLETE, "Vacinação incompleta (Hib, pneumococo)"),
            common::temperature(),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("simples", "Crise febril simples"),
                ("complexa", "Crise febril complexa"),
                ("estado_de_mal_febril", "Estado de mal epiléptico febril"),
            ]),
            overrides: vec![],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Duração ≥ 30 minutos",
                        at_least(DURATION, 30.0),
                        "estado_de_mal_febril",
                    ),
                    LevelRule::new("Duração ≥ 15 minutos", at_least(DURATION, 15.0), "complexa"),
                    LevelRule::new("Crise focal", is(FOCAL), "complexa"),
                    LevelRule::new("Recorrência em 24 horas", is(RECURRED), "complexa"),
                    LevelRule::new(
                        "Idade fora da faixa de 6 a 60 meses",
                        any(vec![below(AGE_MONTHS, 6.0), above(AGE_MONTHS, 60.0)]),
                        "complexa",
                    ),
                    LevelRule::otherwise("Crise generalizada, breve e única", "simples"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Diazepam retal",
                DoseFormula::per_kg(0.5).capped(10.0),
                DoseUnit::Mg,
                "retal",
            )
            .frequency("dose única; repetir uma vez após 5 minutos se necessário")
            .concentration(5.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(is(ONGOING)),
            MedicationRule::new(
                "Midazolam intranasal",
                DoseFormula::per_kg(0.2).capped(10.0),
                DoseUnit::Mg,
                "intranasal ou IM",
            )
            .concentration(5.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(is(ONGOING))
            .note("Alternativa ao diazepam retal"),
            common::paracetamol().when(fever.clone()),
            common::ibuprofen().when(all(vec![fever, at_least(AGE_MONTHS, 6.0)])),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Identificar e tratar o foco da febre",
                "Antitérmicos tratam o desconforto e não previnem recorrência",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "simples",
                    &[
                        "Exames complementares não são necessários de rotina",
                        "Orientar a família sobre o bom prognóstico e o risco de recorrência",
                    ],
                ),
                LevelBlock::new(
                    "complexa",
                    &[
                        "Observação por pelo menos 12 horas",
                        "Considerar EEG e neuroimagem conforme a evolução",
                    ],
                ),
                LevelBlock::new(
                    "estado_de_mal_febril",
                    &["Seguir o protocolo de estado de mal epiléptico"],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    meningitis_risk.clone(),
                    &["Risco de meningite: considerar punção lombar"],
                ),
                ConditionalBlock::new(
                    is(NEUROLOGIC_DISEASE),
                    &["Doença neurológica prévia: avaliação com neurologista"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Crise febril complexa", level_at_least("complexa")),
            Reason::new("Suspeita de infecção do sistema nervoso central", meningitis_risk),
        ],
        icu: Some(vec![Reason::new(
            "Estado de mal epiléptico febril",
            level_is("estado_de_mal_febril"),
        )]),
        discharge_criteria: texts(&[
            "Retorno ao estado neurológico basal",
            "Foco febril identificado e tratável em casa",
            "Família orientada sobre o manejo de nova crise",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn brief_generalized_seizure_is_simple() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 12, "age": 18, "ageUnit": "meses", "durationMinutes": 3,
                "temperature": 39.2
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("simples"));
        assert_eq!(result.dose("Paracetamol").unwrap().amount, 180.0);
        assert!(result.dose("Diazepam retal").is_none());
        assert!(!result.hospitalization.indicated);
    }

    #[test]
    fn age_outside_window_makes_it_complex() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 20, "age": 7, "durationMinutes": 2 }),
        )
        .unwrap();
        assert!(outcome.result().unwrap().classification.is_level("complexa"));
    }

    #[test]
    fn ongoing_seizure_gets_rectal_diazepam() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 30, "age": 4, "durationMinutes": 35, "ongoingSeizure": true }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("estado_de_mal_febril"));
        let diazepam = result.dose("Diazepam retal").unwrap();
        assert_eq!(diazepam.amount, 10.0);
        assert!(diazepam.capped);
    }
}
