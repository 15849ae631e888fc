//! Hypoglycemia: glucose thresholds, neuroglycopenic danger signs and the
//! oral, intravenous or glucagon correction route.
//!
//! No ICU statement.

use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, GLUCOSE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::{DoseFormula, WeightBand};
use crate::predicate::{all, any, below, is, level_at_least, level_is, not};

const SEIZURE: &str = "seizure";
const ALTERED_CONSCIOUSNESS: &str = "alteredConsciousness";
const TOLERATES_ORAL: &str = "toleratesOral";
const VENOUS_ACCESS: &str = "venousAccess";
const KNOWN_DIABETES: &str = "knownDiabetes";

pub fn definition() -> ProtocolDefinition {
    let intravenous = all(vec![
        is(VENOUS_ACCESS),
        any(vec![
            level_is("grave"),
            all(vec![level_at_least("leve"), not(is(TOLERATES_ORAL))]),
        ]),
    ]);

    ProtocolDefinition {
        id: "hipoglicemia".to_string(),
        name: "Hipoglicemia".to_string(),
        description: "Classificação da hipoglicemia e correção por via oral, venosa ou \
                      glucagon."
            .to_string(),
        fields: common::patient_fields(vec![
            common::glucose(),
            FieldSpec::flag(SEIZURE, "Convulsão"),
            FieldSpec::flag(ALTERED_CONSCIOUSNESS, "Sonolência, confusão ou coma"),
            FieldSpec::flag(TOLERATES_ORAL, "Consegue ingerir por via oral com segurança")
                .required(),
            FieldSpec::flag(VENOUS_ACCESS, "Acesso venoso disponível"),
            FieldSpec::flag(KNOWN_DIABETES, "Diabetes em uso de insulina"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("sem_hipoglicemia", "Sem hipoglicemia"),
                ("leve", "Hipoglicemia nível 1 (54 a 69 mg/dL)"),
                ("moderada", "Hipoglicemia nível 2 (< 54 mg/dL)"),
                ("grave", "Hipoglicemia nível 3 (com alteração neurológica)"),
            ]),
            overrides: vec![Override::new(
                "Hipoglicemia com convulsão ou alteração da consciência",
                all(vec![
                    below(GLUCOSE, 70.0),
                    any(vec![is(SEIZURE), is(ALTERED_CONSCIOUSNESS)]),
                ]),
            )],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new("Glicemia < 54 mg/dL", below(GLUCOSE, 54.0), "moderada"),
                    LevelRule::new("Glicemia < 70 mg/dL", below(GLUCOSE, 70.0), "leve"),
                    LevelRule::otherwise("Glicemia ≥ 70 mg/dL", "sem_hipoglicemia"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Carboidrato de absorção rápida",
                DoseFormula::per_kg(0.3).capped(15.0),
                DoseUnit::G,
                "VO",
            )
            .frequency("repetir se glicemia < 70 mg/dL após 15 minutos")
            .rounding(Rounding::Decimals { places: 1 })
            .when(all(vec![
                level_at_least("leve"),
                not(level_is("grave")),
                is(TOLERATES_ORAL),
            ])),
            common::dextrose_bolus().when(intravenous.clone()),
            MedicationRule::new(
                "Glicose 10% (manutenção, VIG 6 mg/kg/min)",
                DoseFormula::per_kg(3.6),
                DoseUnit::MlPerHour,
                "IV contínuo",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![intravenous, level_at_least("moderada")])),
            MedicationRule::new(
                "Glucagon",
                DoseFormula::bands(vec![WeightBand::below(25.0, 0.5), WeightBand::rest(1.0)]),
                DoseUnit::Mg,
                "IM ou SC",
            )
            .frequency("dose única; repetir após 15 minutos se não houver resposta")
            .when(all(vec![level_is("grave"), not(is(VENOUS_ACCESS))])),
        ],
        recommendations: RecommendationRules {
            general: texts(&["Confirmar a glicemia e repetir 15 minutos após cada correção"]),
            by_level: vec![
                LevelBlock::new("sem_hipoglicemia", &["Sem correção necessária"]),
                LevelBlock::new(
                    "leve",
                    &[
                        "Carboidrato de absorção rápida por via oral",
                        "Oferecer lanche com carboidrato complexo após a correção",
                    ],
                ),
                LevelBlock::new(
                    "moderada",
                    &[
                        "Correção oral se consciente e colaborativo; venosa se não",
                        "Manter infusão de glicose se hipoglicemia recorrente",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Glicose venosa imediatamente; glucagon se sem acesso venoso",
                        "Proteger via aérea e tratar convulsão",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    all(vec![level_at_least("leve"), not(is(KNOWN_DIABETES))]),
                    &[
                        "Sem diabetes conhecido: colher amostra crítica antes da correção, se possível",
                    ],
                ),
                ConditionalBlock::new(
                    all(vec![level_at_least("leve"), is(KNOWN_DIABETES)]),
                    &["Diabetes: revisar o esquema de insulina e reforçar a regra dos 15"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Hipoglicemia grave", level_is("grave")),
            Reason::new(
                "Hipoglicemia sem causa conhecida",
                all(vec![level_at_least("moderada"), not(is(KNOWN_DIABETES))]),
            ),
        ],
        icu: None,
        discharge_criteria: texts(&[
            "Glicemias normais após alimentação",
            "Causa identificada e orientada",
            "Cuidadores treinados no uso de glucagon, se diabetes",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn glucagon_without_venous_access() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 30, "age": 9, "glucose": 38, "seizure": true,
                "toleratesOral": false
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("grave"));
        assert_eq!(result.dose("Glucagon").unwrap().amount, 1.0);
        assert!(result.dose("Glicose 10% (bolus)").is_none());
    }

    #[test]
    fn seizure_with_normal_glucose_is_not_hypoglycemia() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 30, "age": 9, "glucose": 95, "seizure": true,
                "toleratesOral": false
            }),
        )
        .unwrap();
        assert!(outcome.result().unwrap().classification.is_level("sem_hipoglicemia"));
    }
}
