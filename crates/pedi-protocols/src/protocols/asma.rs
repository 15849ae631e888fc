//! Acute asthma exacerbation: weighted severity score with danger-sign
//! overrides.

use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, SPO2};
use crate::definition::{
    ClassificationRules, ConditionalBlock, Criterion, FieldSpec, LevelBlock, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, Threshold, levels, texts,
};
use crate::formula::{DoseFormula, WeightBand};
use crate::predicate::{all, at_least, below, eq, is, level_at_least, level_is};

pub const WHEEZING: &str = "wheezing";
pub const CONSCIOUSNESS: &str = "consciousness";
const ACCESSORY_MUSCLES: &str = "accessoryMuscles";
const SPEECH: &str = "speech";
const CYANOSIS: &str = "cyanosis";
const PREVIOUS_ICU: &str = "previousIcuAdmission";
const NO_CONTROLLER: &str = "noControllerTherapy";

pub const MOST_SEVERE: &str = "iminencia_parada";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "asma".to_string(),
        name: "Crise de asma".to_string(),
        description: "Classificação da gravidade da crise asmática por escore clínico e \
                      tratamento inicial na emergência."
            .to_string(),
        fields: common::patient_fields(vec![
            common::oxygen_saturation(),
            common::respiratory_rate(),
            common::heart_rate(),
            FieldSpec::choice(
                WHEEZING,
                "Sibilância",
                &["ausente", "expiratoria", "inspiratoria_expiratoria", "silencio"],
            ),
            FieldSpec::choice(
                ACCESSORY_MUSCLES,
                "Uso de musculatura acessória",
                &["ausente", "leve", "moderado", "intenso"],
            )
            .defaults_to_option("ausente"),
            FieldSpec::choice(SPEECH, "Fala", &["frases", "frases_curtas", "palavras"])
                .defaults_to_option("frases"),
            FieldSpec::choice(CONSCIOUSNESS, "Consciência", &["normal", "agitado", "alterada"])
                .defaults_to_option("normal"),
            FieldSpec::flag(CYANOSIS, "Cianose"),
            FieldSpec::flag(PREVIOUS_ICU, "Internação prévia em UTI por asma"),
            FieldSpec::flag(NO_CONTROLLER, "Sem tratamento de manutenção"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("leve", "Crise leve"),
                ("moderada", "Crise moderada"),
                ("grave", "Crise grave"),
                (MOST_SEVERE, "Iminência de parada respiratória"),
            ]),
            overrides: vec![
                Override::new("Tórax silencioso", eq(WHEEZING, "silencio")),
                Override::new("Sonolência ou confusão mental", eq(CONSCIOUSNESS, "alterada")),
                Override::new("Cianose", is(CYANOSIS)),
            ],
            strategy: Strategy::Scored {
                criteria: vec![
                    Criterion::new("SpO₂ < 90%", below(SPO2, 90.0), 6.0),
                    Criterion::new(
                        "SpO₂ entre 90% e 94%",
                        all(vec![at_least(SPO2, 90.0), below(SPO2, 95.0)]),
                        1.0,
                    ),
                    Criterion::new("Sibilos expiratórios", eq(WHEEZING, "expiratoria"), 1.0),
                    Criterion::new(
                        "Sibilos inspiratórios e expiratórios",
                        eq(WHEEZING, "inspiratoria_expiratoria"),
                        2.0,
                    ),
                    Criterion::new(
                        "Uso moderado de musculatura acessória",
                        eq(ACCESSORY_MUSCLES, "moderado"),
                        1.0,
                    ),
                    Criterion::new(
                        "Uso intenso de musculatura acessória",
                        eq(ACCESSORY_MUSCLES, "intenso"),
                        2.0,
                    ),
                    Criterion::new("Fala frases curtas", eq(SPEECH, "frases_curtas"), 1.0),
                    Criterion::new("Fala apenas palavras", eq(SPEECH, "palavras"), 2.0),
                    Criterion::new("Taquipneia para a idade", common::tachypnea(), 1.0),
                    Criterion::new("Taquicardia para a idade", common::tachycardia(), 1.0),
                    Criterion::new("Agitação", eq(CONSCIOUSNESS, "agitado"), 1.0),
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
                "Salbutamol spray (100 mcg/jato)",
                DoseFormula::per_kg(0.5).capped(10.0).floored(4.0),
                DoseUnit::Puffs,
                "inalatório com espaçador",
            )
            .frequency("a cada 20 minutos na primeira hora (3 doses)")
            .rounding(Rounding::CeilTo { step: 1.0 }),
            MedicationRule::new(
                "Brometo de ipratrópio",
                DoseFormula::bands(vec![WeightBand::below(20.0, 250.0), WeightBand::rest(500.0)]),
                DoseUnit::Mcg,
                "nebulização",
            )
            .frequency("a cada 20 minutos na primeira hora, junto ao salbutamol")
            .when(level_at_least("moderada")),
            MedicationRule::new(
                "Prednisolona",
                DoseFormula::per_kg(1.0).capped(40.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia por 3 a 5 dias")
            .concentration(3.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("moderada")),
            MedicationRule::new(
                "Metilprednisolona",
                DoseFormula::per_kg(2.0).capped(60.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 12 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_at_least("grave")),
            MedicationRule::new(
                "Sulfato de magnésio 50%",
                DoseFormula::per_kg(50.0).capped(2000.0),
                DoseUnit::Mg,
                "IV em 20 minutos",
            )
            .frequency("dose única")
            .concentration(500.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_at_least("grave"))
            .note("Diluir para concentração de até 20% antes de infundir"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Oxigênio para manter SpO₂ entre 94% e 98%",
                "Manter o paciente sentado, em posição confortável",
                "Reavaliar após cada ciclo de broncodilatador",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "leve",
                    &[
                        "Salbutamol inalatório com espaçador",
                        "Corticoide oral se resposta incompleta após a primeira hora",
                    ],
                ),
                LevelBlock::new(
                    "moderada",
                    &[
                        "Salbutamol e ipratrópio a cada 20 minutos na primeira hora",
                        "Corticoide oral na primeira hora de atendimento",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Salbutamol contínuo ou a cada 20 minutos com ipratrópio",
                        "Corticoide IV e sulfato de magnésio",
                        "Acesso venoso e gasometria",
                    ],
                ),
                LevelBlock::new(
                    MOST_SEVERE,
                    &[
                        "Oxigênio a 100% e acionar equipe de via aérea avançada",
                        "Considerar ventilação não invasiva ou intubação",
                        "Terbutalina ou salbutamol IV se refratário",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(PREVIOUS_ICU),
                    &["História de asma quase fatal: limiar baixo para internação"],
                ),
                ConditionalBlock::new(
                    is(NO_CONTROLLER),
                    &["Iniciar ou ajustar corticoide inalatório de manutenção na alta"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Crise grave", level_at_least("grave")),
            Reason::new("SpO₂ < 92% na admissão", below(SPO2, 92.0)),
            Reason::new(
                "Internação prévia em UTI por asma",
                all(vec![level_at_least("moderada"), is(PREVIOUS_ICU)]),
            ),
        ],
        icu: Some(vec![
            Reason::new("Iminência de parada respiratória", level_is(MOST_SEVERE)),
            Reason::new(
                "Crise grave com história de asma quase fatal",
                all(vec![level_at_least("grave"), is(PREVIOUS_ICU)]),
            ),
        ]),
        discharge_criteria: texts(&[
            "SpO₂ ≥ 94% em ar ambiente",
            "Intervalo entre broncodilatadores de pelo menos 4 horas",
            "Técnica inalatória revisada e plano de ação por escrito",
            "Reavaliação ambulatorial em 48 a 72 horas",
        ]),
    }
}
