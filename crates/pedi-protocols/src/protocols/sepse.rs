//! Pediatric sepsis and septic shock: systemic inflammatory response with
//! suspected infection, graded by organ dysfunction and perfusion.

use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, SYSTOLIC_BP, TEMPERATURE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, CriterionSet, FieldSpec, Finding, LevelBlock,
    LevelRule, MedicationRule, Override, ProtocolDefinition, Reason, RecommendationRules,
    Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{
    above, all, any, at_least, below, hypotensive, is, level_at_least, level_is, not,
};

const SUSPECTED_INFECTION: &str = "suspectedInfection";
const LEUKOCYTES: &str = "abnormalLeukocytes";
const ALTERED_MENTAL_STATUS: &str = "alteredMentalStatus";
const OLIGURIA: &str = "oliguria";
const LACTATE: &str = "lactate";
const CAPILLARY_REFILL: &str = "capillaryRefillSeconds";
const COLD_EXTREMITIES: &str = "coldExtremities";
const FLUID_OVERLOAD: &str = "fluidOverload";
const HYPOGLYCEMIA: &str = "hypoglycemia";

pub fn definition() -> ProtocolDefinition {
    let fever_or_hypothermia = any(vec![above(TEMPERATURE, 38.5), below(TEMPERATURE, 36.0)]);

    ProtocolDefinition {
        id: "sepse".to_string(),
        name: "Sepse e choque séptico".to_string(),
        description: "Reconhecimento precoce da sepse pediátrica e manejo da primeira hora."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::flag(SUSPECTED_INFECTION, "Infecção suspeita ou confirmada"),
            common::temperature(),
            common::heart_rate(),
            common::respiratory_rate(),
            common::systolic_bp(),
            FieldSpec::flag(
                LEUKOCYTES,
                "Leucocitose, leucopenia ou mais de 10% de formas jovens",
            ),
            FieldSpec::flag(ALTERED_MENTAL_STATUS, "Alteração do estado mental"),
            FieldSpec::flag(OLIGURIA, "Oligúria (< 1 mL/kg/h)"),
            FieldSpec::number(LACTATE, "Lactato (mmol/L)")
                .between(0.0, 30.0)
                .unassessed(),
            FieldSpec::number(CAPILLARY_REFILL, "Tempo de enchimento capilar (s)")
                .between(0.0, 20.0)
                .unassessed(),
            FieldSpec::flag(COLD_EXTREMITIES, "Extremidades frias ou pulsos finos"),
            FieldSpec::flag(FLUID_OVERLOAD, "Hepatomegalia ou estertores crepitantes"),
            FieldSpec::flag(HYPOGLYCEMIA, "Hipoglicemia"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("sem_criterios", "Sem critérios de sepse"),
                ("sepse", "Sepse"),
                ("sepse_grave", "Sepse com disfunção orgânica"),
                ("choque_septico", "Choque séptico"),
            ]),
            overrides: vec![Override::new(
                "Hipotensão para a idade com infecção suspeita",
                all(vec![is(SUSPECTED_INFECTION), hypotensive(SYSTOLIC_BP)]),
            )],
            strategy: Strategy::CriteriaSets {
                prerequisites: vec![
                    Finding::new("Infecção suspeita ou confirmada", is(SUSPECTED_INFECTION)),
                    Finding::new(
                        "Alteração de temperatura ou de leucócitos",
                        any(vec![fever_or_hypothermia.clone(), is(LEUKOCYTES)]),
                    ),
                ],
                sets: vec![
                    CriterionSet::new(
                        "temperatura",
                        "Temperatura",
                        vec![Finding::new(
                            "Temperatura > 38,5 °C ou < 36 °C",
                            fever_or_hypothermia,
                        )],
                    ),
                    CriterionSet::new(
                        "frequencia_cardiaca",
                        "Frequência cardíaca",
                        vec![Finding::new("Taquicardia para a idade", common::tachycardia())],
                    ),
                    CriterionSet::new(
                        "frequencia_respiratoria",
                        "Frequência respiratória",
                        vec![Finding::new("Taquipneia para a idade", common::tachypnea())],
                    ),
                    CriterionSet::new(
                        "leucocitos",
                        "Leucócitos",
                        vec![Finding::new("Leucócitos alterados", is(LEUKOCYTES))],
                    ),
                ],
                minimum: 2,
                met: "sepse".to_string(),
                not_met: "sem_criterios".to_string(),
                escalations: vec![
                    LevelRule::new(
                        "Alteração do estado mental",
                        is(ALTERED_MENTAL_STATUS),
                        "sepse_grave",
                    ),
                    LevelRule::new("Oligúria", is(OLIGURIA), "sepse_grave"),
                    LevelRule::new("Lactato ≥ 2 mmol/L", at_least(LACTATE, 2.0), "sepse_grave"),
                    LevelRule::new(
                        "Má perfusão: enchimento capilar > 3 s com extremidades frias",
                        all(vec![above(CAPILLARY_REFILL, 3.0), is(COLD_EXTREMITIES)]),
                        "choque_septico",
                    ),
                    LevelRule::new("Lactato ≥ 4 mmol/L", at_least(LACTATE, 4.0), "choque_septico"),
                ],
            },
        },
        medications: vec![
            common::saline_bolus("Soro fisiológico 0,9% ou Ringer lactato", 20.0)
                .frequency("em 5 a 20 minutos; até 40 a 60 mL/kg na primeira hora")
                .when(all(vec![level_at_least("sepse_grave"), not(is(FLUID_OVERLOAD))]))
                .note("Reavaliar após cada bolus; suspender se hepatomegalia ou estertores"),
            MedicationRule::new(
                "Ceftriaxona",
                DoseFormula::per_kg(100.0).capped(4000.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("uma vez ao dia, na primeira hora")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_at_least("sepse")),
            MedicationRule::new(
                "Vancomicina",
                DoseFormula::per_kg(60.0).capped(4000.0).divided(4),
                DoseUnit::Mg,
                "IV em 60 minutos",
            )
            .frequency("a cada 6 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("choque_septico")),
            MedicationRule::new(
                "Adrenalina em infusão contínua",
                DoseFormula::per_kg(0.1),
                DoseUnit::McgPerMinute,
                "IV contínuo",
            )
            .rounding(Rounding::Decimals { places: 2 })
            .when(level_is("choque_septico"))
            .note("Dose inicial de 0,1 mcg/kg/min; titular entre 0,05 e 1 mcg/kg/min"),
            common::dextrose_bolus().when(is(HYPOGLYCEMIA)),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Monitorização contínua e oxigênio suplementar",
                "Acesso venoso ou intraósseo imediato",
                "Colher hemocultura, gasometria, lactato e glicemia sem atrasar o antibiótico",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "sem_criterios",
                    &[
                        "Tratar o foco infeccioso",
                        "Reavaliar sinais vitais e perfusão periodicamente",
                    ],
                ),
                LevelBlock::new(
                    "sepse",
                    &[
                        "Antibiótico de amplo espectro na primeira hora",
                        "Reavaliação frequente de perfusão e estado mental",
                    ],
                ),
                LevelBlock::new(
                    "sepse_grave",
                    &[
                        "Antibiótico na primeira hora",
                        "Expansão volêmica em bolus com reavaliação após cada alíquota",
                        "Sondagem vesical para controle da diurese",
                    ],
                ),
                LevelBlock::new(
                    "choque_septico",
                    &[
                        "Expansão volêmica e antibiótico na primeira hora",
                        "Droga vasoativa se persistir choque após 40 a 60 mL/kg",
                        "Considerar hidrocortisona se choque refratário a catecolaminas",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(FLUID_OVERLOAD),
                    &["Sinais de sobrecarga hídrica: suspender expansão e iniciar droga vasoativa"],
                ),
                ConditionalBlock::new(
                    is(HYPOGLYCEMIA),
                    &["Corrigir hipoglicemia e manter glicemia entre 70 e 150 mg/dL"],
                ),
            ],
        },
        hospitalization: vec![Reason::new("Sepse", level_at_least("sepse"))],
        icu: Some(vec![
            Reason::new("Disfunção orgânica ou choque", level_at_least("sepse_grave")),
        ]),
        discharge_criteria: texts(&[
            "Sinais vitais normais para a idade",
            "Foco infeccioso identificado e tratável ambulatorialmente",
            "Reavaliação médica em 24 horas",
        ]),
    }
}
