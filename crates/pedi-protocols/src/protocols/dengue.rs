//! Dengue: clinical staging into groups A to D with the matching
//! hydration plan.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, SYSTOLIC_BP};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::{DoseFormula, WeightBand};
use crate::predicate::{any, below, hypotensive, is, level_at_least, level_is, not};

const ABDOMINAL_PAIN: &str = "abdominalPain";
const PERSISTENT_VOMITING: &str = "persistentVomiting";
const FLUID_ACCUMULATION: &str = "fluidAccumulation";
const MUCOSAL_BLEEDING: &str = "mucosalBleeding";
const LETHARGY: &str = "lethargy";
const HEPATOMEGALY: &str = "hepatomegaly";
const HEMATOCRIT_RISE: &str = "hematocritRise";
const POSTURAL_HYPOTENSION: &str = "posturalHypotension";
const WEAK_PULSE: &str = "weakPulse";
const SLOW_CAPILLARY_REFILL: &str = "slowCapillaryRefill";
const NARROW_PULSE_PRESSURE: &str = "narrowPulsePressure";
const SEVERE_BLEEDING: &str = "severeBleeding";
const ORGAN_IMPAIRMENT: &str = "organImpairment";
const SKIN_BLEEDING: &str = "skinBleeding";
const SPECIAL_CONDITION: &str = "specialCondition";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "dengue".to_string(),
        name: "Dengue".to_string(),
        description: "Estadiamento clínico da dengue (grupos A a D) e hidratação \
                      correspondente."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::flag(ABDOMINAL_PAIN, "Dor abdominal intensa e contínua"),
            FieldSpec::flag(PERSISTENT_VOMITING, "Vômitos persistentes"),
            FieldSpec::flag(FLUID_ACCUMULATION, "Acúmulo de líquidos (ascite, derrame pleural)"),
            FieldSpec::flag(MUCOSAL_BLEEDING, "Sangramento de mucosa"),
            FieldSpec::flag(LETHARGY, "Letargia ou irritabilidade"),
            FieldSpec::flag(HEPATOMEGALY, "Hepatomegalia maior que 2 cm"),
            FieldSpec::flag(HEMATOCRIT_RISE, "Aumento progressivo do hematócrito"),
            FieldSpec::flag(POSTURAL_HYPOTENSION, "Hipotensão postural ou lipotimia"),
            FieldSpec::flag(WEAK_PULSE, "Pulso rápido e fraco"),
            FieldSpec::flag(SLOW_CAPILLARY_REFILL, "Enchimento capilar > 2 segundos"),
            FieldSpec::flag(NARROW_PULSE_PRESSURE, "Pressão arterial convergente (≤ 20 mmHg)"),
            common::systolic_bp(),
            FieldSpec::flag(SEVERE_BLEEDING, "Sangramento grave"),
            FieldSpec::flag(ORGAN_IMPAIRMENT, "Comprometimento grave de órgãos"),
            FieldSpec::flag(SKIN_BLEEDING, "Prova do laço positiva ou sangramento de pele"),
            FieldSpec::flag(
                SPECIAL_CONDITION,
                "Condição clínica especial, comorbidade ou risco social",
            ),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("grupo_a", "Grupo A: sem sinais de alarme ou condição especial"),
                ("grupo_b", "Grupo B: sangramento de pele ou condição especial"),
                ("grupo_c", "Grupo C: sinais de alarme"),
                ("grupo_d", "Grupo D: sinais de choque ou dengue grave"),
            ]),
            overrides: vec![],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Choque, sangramento grave ou disfunção de órgãos",
                        any(vec![
                            is(WEAK_PULSE),
                            is(SLOW_CAPILLARY_REFILL),
                            is(NARROW_PULSE_PRESSURE),
                            hypotensive(SYSTOLIC_BP),
                            is(SEVERE_BLEEDING),
                            is(ORGAN_IMPAIRMENT),
                        ]),
                        "grupo_d",
                    ),
                    LevelRule::new(
                        "Sinais de alarme",
                        any(vec![
                            is(ABDOMINAL_PAIN),
                            is(PERSISTENT_VOMITING),
                            is(FLUID_ACCUMULATION),
                            is(MUCOSAL_BLEEDING),
                            is(LETHARGY),
                            is(HEPATOMEGALY),
                            is(HEMATOCRIT_RISE),
                            is(POSTURAL_HYPOTENSION),
                        ]),
                        "grupo_c",
                    ),
                    LevelRule::new(
                        "Sangramento de pele, condição especial ou lactente",
                        any(vec![
                            is(SKIN_BLEEDING),
                            is(SPECIAL_CONDITION),
                            below(AGE_MONTHS, 24.0),
                        ]),
                        "grupo_b",
                    ),
                    LevelRule::otherwise("Sem sinais de alarme", "grupo_a"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Hidratação oral",
                DoseFormula::per_kg_bands(vec![
                    WeightBand::below(10.0, 130.0),
                    WeightBand::below(20.0, 100.0),
                    WeightBand::rest(80.0),
                ]),
                DoseUnit::MlPerDay,
                "VO",
            )
            .rounding(Rounding::NearestTo { step: 50.0 })
            .when(not(level_at_least("grupo_c")))
            .note("Um terço com soro de reidratação oral; o restante com líquidos caseiros"),
            common::saline_bolus("Soro fisiológico 0,9% (expansão)", 10.0)
                .frequency("na primeira hora; repetir até 3 vezes conforme reavaliação")
                .when(level_is("grupo_c")),
            common::saline_bolus("Soro fisiológico 0,9% (choque)", 20.0)
                .frequency("em 20 minutos; repetir até 3 vezes")
                .when(level_is("grupo_d")),
            MedicationRule::new(
                "Paracetamol",
                DoseFormula::per_kg(10.0).capped(750.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 6 horas, se febre ou dor")
            .concentration(200.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 }),
            common::dipyrone(),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Não usar anti-inflamatórios não esteroides nem salicilatos",
                "Notificar o caso",
                "Orientar sinais de alarme, principalmente na defervescência",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "grupo_a",
                    &[
                        "Tratamento domiciliar com hidratação oral",
                        "Reavaliação no dia de melhora da febre ou no 5º dia de doença",
                    ],
                ),
                LevelBlock::new(
                    "grupo_b",
                    &[
                        "Hemograma obrigatório; hidratação oral enquanto aguarda",
                        "Se hematócrito normal, tratamento domiciliar com reavaliação diária",
                    ],
                ),
                LevelBlock::new(
                    "grupo_c",
                    &[
                        "Expansão com 10 mL/kg de SF 0,9% na primeira hora",
                        "Reavaliar clínica e hematócrito após cada etapa",
                        "Internação em leito de observação",
                    ],
                ),
                LevelBlock::new(
                    "grupo_d",
                    &[
                        "Expansão rápida com 20 mL/kg em 20 minutos, até 3 vezes",
                        "Internação em UTI",
                        "Se hematócrito em queda e instabilidade: investigar hemorragia",
                    ],
                ),
            ],
            conditional: vec![ConditionalBlock::new(
                below(AGE_MONTHS, 24.0),
                &["Lactente: maior risco de evolução grave, reavaliação diária obrigatória"],
            )],
        },
        hospitalization: vec![Reason::new(
            "Sinais de alarme ou choque",
            level_at_least("grupo_c"),
        )],
        icu: Some(vec![Reason::new("Dengue grave", level_is("grupo_d"))]),
        discharge_criteria: texts(&[
            "Estabilidade hemodinâmica por 48 horas",
            "Afebril há 48 horas",
            "Hematócrito normal e estável por 24 horas",
            "Plaquetas em elevação",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn oral_fluids_use_weight_band_per_kg() {
        let outcome =
            calculate_with(&definition(), &json!({ "weight": 15, "age": 4 })).unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("grupo_a"));
        assert_eq!(result.dose("Hidratação oral").unwrap().amount, 1500.0);
    }

    #[test]
    fn alarm_signs_move_to_group_c() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 15, "age": 4, "abdominalPain": true }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("grupo_c"));
        assert!(result.dose("Hidratação oral").is_none());
        assert_eq!(result.dose("Soro fisiológico 0,9% (expansão)").unwrap().amount, 150.0);
        assert!(result.hospitalization.indicated);
    }
}
