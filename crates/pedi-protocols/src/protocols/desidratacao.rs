//! Dehydration in acute diarrhea, graded with the WHO treatment plans A, B
//! and C.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common;
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::{DoseFormula, WeightBand};
use crate::predicate::{
    all, at_least, below, count_at_least, eq, is, level_at_least, level_is, one_of,
};
use crate::validate::WEIGHT;

const GENERAL_CONDITION: &str = "generalCondition";
const EYES: &str = "eyes";
const THIRST: &str = "thirst";
const SKIN_PINCH: &str = "skinPinch";
const SHOCK_SIGNS: &str = "shockSigns";
const PERSISTENT_VOMITING: &str = "persistentVomiting";
const BLOODY_STOOL: &str = "bloodyStool";
const SEVERE_MALNUTRITION: &str = "severeMalnutrition";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "desidratacao".to_string(),
        name: "Desidratação na diarreia aguda".to_string(),
        description: "Avaliação do estado de hidratação e plano de reidratação A, B ou C."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::choice(
                GENERAL_CONDITION,
                "Estado geral",
                &["alerta", "irritado", "letargico"],
            ),
            FieldSpec::choice(EYES, "Olhos", &["normais", "fundos"]),
            FieldSpec::choice(THIRST, "Sede", &["normal", "sedento", "bebe_mal"]),
            FieldSpec::choice(SKIN_PINCH, "Sinal da prega", &["normal", "lenta", "muito_lenta"]),
            FieldSpec::flag(
                SHOCK_SIGNS,
                "Sinais de choque (pulsos fracos, enchimento capilar > 3 s)",
            ),
            FieldSpec::flag(PERSISTENT_VOMITING, "Vômitos persistentes"),
            FieldSpec::flag(BLOODY_STOOL, "Sangue nas fezes"),
            FieldSpec::flag(SEVERE_MALNUTRITION, "Desnutrição grave"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("sem_desidratacao", "Sem desidratação (plano A)"),
                ("desidratacao", "Desidratação (plano B)"),
                ("desidratacao_grave", "Desidratação grave (plano C)"),
            ]),
            overrides: vec![Override::new("Sinais de choque", is(SHOCK_SIGNS))],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Dois ou mais sinais de desidratação grave",
                        count_at_least(
                            2,
                            vec![
                                eq(GENERAL_CONDITION, "letargico"),
                                eq(EYES, "fundos"),
                                eq(THIRST, "bebe_mal"),
                                eq(SKIN_PINCH, "muito_lenta"),
                            ],
                        ),
                        "desidratacao_grave",
                    ),
                    LevelRule::new(
                        "Dois ou mais sinais de desidratação",
                        count_at_least(
                            2,
                            vec![
                                one_of(GENERAL_CONDITION, &["irritado", "letargico"]),
                                eq(EYES, "fundos"),
                                one_of(THIRST, &["sedento", "bebe_mal"]),
                                one_of(SKIN_PINCH, &["lenta", "muito_lenta"]),
                            ],
                        ),
                        "desidratacao",
                    ),
                    LevelRule::otherwise("Sinais insuficientes", "sem_desidratacao"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Soro de reidratação oral (após cada evacuação)",
                DoseFormula::per_kg(10.0).capped(250.0),
                DoseUnit::Ml,
                "VO",
            )
            .frequency("após cada evacuação líquida")
            .rounding(Rounding::NearestTo { step: 10.0 })
            .when(level_is("sem_desidratacao")),
            MedicationRule::new(
                "Soro de reidratação oral (plano B)",
                DoseFormula::per_kg(75.0),
                DoseUnit::Ml,
                "VO",
            )
            .frequency("em 4 a 6 horas, em pequenas alíquotas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("desidratacao")),
            common::saline_bolus("Soro fisiológico 0,9% (fase rápida)", 20.0)
                .frequency("em 30 minutos; repetir até melhora da perfusão")
                .when(level_is("desidratacao_grave")),
            MedicationRule::new(
                "Soro de manutenção (Holliday-Segar)",
                DoseFormula::holliday_segar().divided(24),
                DoseUnit::MlPerHour,
                "IV",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("desidratacao_grave"))
            .note("Solução isotônica com glicose; somar reposição das perdas"),
            MedicationRule::new(
                "Ondansetrona",
                DoseFormula::bands(vec![
                    WeightBand::below(15.0, 2.0),
                    WeightBand::below(30.0, 4.0),
                    WeightBand::rest(8.0),
                ]),
                DoseUnit::Mg,
                "VO (comprimido orodispersível)",
            )
            .frequency("dose única antes da reidratação oral")
            .when(all(vec![
                is(PERSISTENT_VOMITING),
                at_least(AGE_MONTHS, 6.0),
                at_least(WEIGHT, 8.0),
            ])),
            MedicationRule::new("Zinco", DoseFormula::fixed(20.0), DoseUnit::Mg, "VO")
                .frequency("uma vez ao dia por 10 a 14 dias")
                .when(at_least(AGE_MONTHS, 6.0)),
            MedicationRule::new(
                "Zinco (menores de 6 meses)",
                DoseFormula::fixed(10.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia por 10 a 14 dias")
            .when(below(AGE_MONTHS, 6.0)),
            MedicationRule::new(
                "Azitromicina",
                DoseFormula::per_kg(10.0).capped(500.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia por 3 dias")
            .concentration(200.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(is(BLOODY_STOOL))
            .note("Disenteria com comprometimento do estado geral"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Manter aleitamento materno e alimentação habitual",
                "Não usar antidiarreicos ou antieméticos de rotina",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "sem_desidratacao",
                    &[
                        "Plano A: tratamento domiciliar com soro de reidratação oral após cada evacuação",
                        "Orientar sinais de desidratação e retorno",
                    ],
                ),
                LevelBlock::new(
                    "desidratacao",
                    &[
                        "Plano B: reidratação oral supervisionada na unidade de saúde",
                        "Reavaliar o estado de hidratação ao fim do período",
                        "Se vômitos persistentes ou piora, passar ao plano C",
                    ],
                ),
                LevelBlock::new(
                    "desidratacao_grave",
                    &[
                        "Plano C: reidratação venosa imediata",
                        "Reavaliar a cada 15 a 30 minutos; iniciar SRO assim que possível",
                        "Dosar eletrólitos e glicemia",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(SEVERE_MALNUTRITION),
                    &["Desnutrição grave: reidratação lenta com ReSoMal, evitar sobrecarga"],
                ),
                ConditionalBlock::new(
                    is(BLOODY_STOOL),
                    &["Disenteria: antibioticoterapia e reavaliação em 48 horas"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Desidratação grave", level_is("desidratacao_grave")),
            Reason::new(
                "Vômitos persistentes com desidratação",
                all(vec![is(PERSISTENT_VOMITING), level_at_least("desidratacao")]),
            ),
            Reason::new("Desnutrição grave", is(SEVERE_MALNUTRITION)),
            Reason::new(
                "Lactente menor de 2 meses desidratado",
                all(vec![below(AGE_MONTHS, 2.0), level_at_least("desidratacao")]),
            ),
        ],
        icu: Some(vec![Reason::new("Choque hipovolêmico", is(SHOCK_SIGNS))]),
        discharge_criteria: texts(&[
            "Hidratado e aceitando a via oral",
            "Cuidadores orientados sobre o plano A e sinais de alarme",
            "Retorno em 24 a 48 horas se persistirem perdas",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    fn assess(condition: &str, eyes: &str, thirst: &str, pinch: &str) -> String {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 12, "age": 2, "generalCondition": condition, "eyes": eyes,
                "thirst": thirst, "skinPinch": pinch
            }),
        )
        .unwrap();
        outcome.result().unwrap().classification.level.id.clone()
    }

    #[test]
    fn plans_follow_sign_counts() {
        assert_eq!(assess("alerta", "normais", "normal", "normal"), "sem_desidratacao");
        assert_eq!(assess("irritado", "fundos", "normal", "normal"), "desidratacao");
        assert_eq!(assess("letargico", "fundos", "bebe_mal", "lenta"), "desidratacao_grave");
    }

    #[test]
    fn plan_b_volume_is_75_ml_per_kg() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 12, "age": 2, "generalCondition": "irritado", "eyes": "fundos",
                "thirst": "sedento", "skinPinch": "normal"
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        let dose = result.dose("Soro de reidratação oral (plano B)").unwrap();
        assert_eq!(dose.amount, 900.0);
    }
}
