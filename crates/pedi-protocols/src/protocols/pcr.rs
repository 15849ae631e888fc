//! Pediatric cardiac arrest: shockable versus non-shockable rhythm, with
//! defibrillation energy and resuscitation drug doses.

use pedi_core::models::params::FieldValue;
use pedi_core::units::{DoseUnit, Rounding};

use super::common;
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{all, always, at_least, below, eq, is, level_is, not};

const RHYTHM: &str = "rhythm";
const SHOCKS: &str = "shocksDelivered";
const ADVANCED_AIRWAY: &str = "advancedAirway";
const HYPERKALEMIA_OR_TCA: &str = "hyperkalemiaOrTricyclic";

pub fn definition() -> ProtocolDefinition {
    let shockable = level_is("chocavel");

    ProtocolDefinition {
        id: "pcr".to_string(),
        name: "Parada cardiorrespiratória".to_string(),
        description: "Doses de reanimação e energia de desfibrilação conforme o ritmo de \
                      parada."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::choice(RHYTHM, "Ritmo", &["fv_tv_sem_pulso", "assistolia", "aesp"]),
            FieldSpec::integer(SHOCKS, "Choques já aplicados")
                .between(0.0, 20.0)
                .defaults_to(FieldValue::Number(0.0)),
            FieldSpec::flag(ADVANCED_AIRWAY, "Via aérea avançada instalada"),
            FieldSpec::flag(HYPERKALEMIA_OR_TCA, "Hipercalemia ou intoxicação por tricíclico"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("nao_chocavel", "Ritmo não chocável (assistolia ou AESP)"),
                ("chocavel", "Ritmo chocável (FV ou TV sem pulso)"),
            ]),
            overrides: vec![],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Fibrilação ventricular ou taquicardia ventricular sem pulso",
                        eq(RHYTHM, "fv_tv_sem_pulso"),
                        "chocavel",
                    ),
                    LevelRule::otherwise(
                        "Assistolia ou atividade elétrica sem pulso",
                        "nao_chocavel",
                    ),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Adrenalina IV/IO",
                DoseFormula::per_kg(0.01).capped(1.0),
                DoseUnit::Mg,
                "IV ou IO",
            )
            .frequency("a cada 3 a 5 minutos")
            .concentration(0.1, 1.0)
            .rounding(Rounding::Decimals { places: 2 })
            .note("Solução 1:10.000 (0,1 mg/mL)"),
            MedicationRule::new(
                "Desfibrilação (primeiro choque)",
                DoseFormula::per_kg(2.0),
                DoseUnit::Joules,
                "desfibrilador",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![shockable.clone(), below(SHOCKS, 1.0)])),
            MedicationRule::new(
                "Desfibrilação (choques seguintes)",
                DoseFormula::per_kg(4.0).capped(200.0),
                DoseUnit::Joules,
                "desfibrilador",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![shockable.clone(), at_least(SHOCKS, 1.0)]))
            .note("Aumentar até 10 J/kg se FV persistente, sem exceder a dose de adulto"),
            MedicationRule::new(
                "Amiodarona",
                DoseFormula::per_kg(5.0).capped(300.0),
                DoseUnit::Mg,
                "IV ou IO em bolus",
            )
            .frequency("pode repetir até 2 vezes")
            .concentration(50.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![shockable.clone(), at_least(SHOCKS, 2.0)])),
            MedicationRule::new(
                "Lidocaína",
                DoseFormula::per_kg(1.0).capped(100.0),
                DoseUnit::Mg,
                "IV ou IO",
            )
            .concentration(20.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![shockable, at_least(SHOCKS, 2.0)]))
            .note("Alternativa à amiodarona"),
            MedicationRule::new(
                "Bicarbonato de sódio 8,4%",
                DoseFormula::per_kg(1.0).capped(50.0),
                DoseUnit::Ml,
                "IV ou IO lento",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(is(HYPERKALEMIA_OR_TCA))
            .note("1 mEq/kg; não de rotina"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Compressões de alta qualidade: 100 a 120 por minuto, profundidade de um terço do tórax",
                "Minimizar interrupções; trocar o compressor a cada 2 minutos",
                "Investigar causas reversíveis (5 Hs e 5 Ts)",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "nao_chocavel",
                    &[
                        "Adrenalina o mais cedo possível",
                        "Checar ritmo a cada 2 minutos",
                    ],
                ),
                LevelBlock::new(
                    "chocavel",
                    &[
                        "Desfibrilar e retomar compressões imediatamente",
                        "Adrenalina após o segundo choque",
                        "Amiodarona ou lidocaína após o terceiro choque",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(ADVANCED_AIRWAY),
                    &["Via aérea avançada: 1 ventilação a cada 2 a 3 segundos, compressões contínuas"],
                ),
                ConditionalBlock::new(
                    not(is(ADVANCED_AIRWAY)),
                    &["Sem via aérea avançada: relação 15:2 com dois socorristas"],
                ),
            ],
        },
        hospitalization: vec![Reason::new("Parada cardiorrespiratória", always())],
        icu: Some(vec![Reason::new("Cuidados pós-parada", always())]),
        discharge_criteria: vec![],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn first_shock_is_two_joules_per_kg() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 20, "age": 6, "rhythm": "fv_tv_sem_pulso" }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("chocavel"));
        assert_eq!(result.dose("Desfibrilação (primeiro choque)").unwrap().amount, 40.0);
        assert!(result.dose("Amiodarona").is_none());

        let adrenaline = result.dose("Adrenalina IV/IO").unwrap();
        assert_eq!(adrenaline.amount, 0.2);
        assert_eq!(adrenaline.volume.as_ref().unwrap().ml, 2.0);
    }

    #[test]
    fn later_shocks_are_capped() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 60, "age": 14, "rhythm": "fv_tv_sem_pulso", "shocksDelivered": 2
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        let shock = result.dose("Desfibrilação (choques seguintes)").unwrap();
        assert_eq!(shock.amount, 200.0);
        assert!(shock.capped);
        assert_eq!(result.dose("Amiodarona").unwrap().amount, 300.0);
    }

    #[test]
    fn asystole_always_goes_to_icu() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 10, "age": 1, "rhythm": "assistolia" }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("nao_chocavel"));
        assert!(result.dose("Desfibrilação (primeiro choque)").is_none());
        assert!(result.icu_indication.as_ref().unwrap().indicated);
        assert!(result.discharge_criteria.is_empty());
    }
}
