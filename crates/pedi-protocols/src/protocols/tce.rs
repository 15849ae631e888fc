//! Traumatic brain injury: Glasgow-based severity and PECARN imaging
//! rules for minor head trauma.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, GLASGOW};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{
    Predicate, all, any, at_least, at_most, below, is, level_at_least, level_is, not,
};

const LOSS_OF_CONSCIOUSNESS: &str = "lossOfConsciousness";
const SEVERE_MECHANISM: &str = "severeMechanism";
const VOMITING: &str = "vomiting";
const SEVERE_HEADACHE: &str = "severeHeadache";
const ALTERED_MENTAL_STATUS: &str = "alteredMentalStatus";
const PALPABLE_FRACTURE: &str = "palpableSkullFracture";
const BASILAR_FRACTURE: &str = "basilarSkullFractureSigns";
const SCALP_HEMATOMA: &str = "scalpHematoma";
const ACTING_ABNORMALLY: &str = "actingAbnormally";
const FOCAL_DEFICIT: &str = "focalDeficit";
const SEIZURE: &str = "seizure";
const HERNIATION: &str = "herniationSigns";
const COAGULOPATHY: &str = "coagulopathy";
const SUSPECTED_ABUSE: &str = "suspectedAbuse";

/// PECARN high-risk findings: CT recommended.
fn pecarn_high_risk() -> Predicate {
    any(vec![
        at_most(GLASGOW, 14.0),
        is(ALTERED_MENTAL_STATUS),
        all(vec![below(AGE_MONTHS, 24.0), is(PALPABLE_FRACTURE)]),
        all(vec![at_least(AGE_MONTHS, 24.0), is(BASILAR_FRACTURE)]),
    ])
}

/// PECARN intermediate-risk findings: CT or observation.
fn pecarn_intermediate_risk() -> Predicate {
    let under_two = all(vec![
        below(AGE_MONTHS, 24.0),
        any(vec![
            is(SCALP_HEMATOMA),
            is(LOSS_OF_CONSCIOUSNESS),
            is(SEVERE_MECHANISM),
            is(ACTING_ABNORMALLY),
        ]),
    ]);
    let two_and_over = all(vec![
        at_least(AGE_MONTHS, 24.0),
        any(vec![
            is(LOSS_OF_CONSCIOUSNESS),
            is(VOMITING),
            is(SEVERE_MECHANISM),
            is(SEVERE_HEADACHE),
        ]),
    ]);
    all(vec![not(pecarn_high_risk()), any(vec![under_two, two_and_over])])
}

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "tce".to_string(),
        name: "Traumatismo cranioencefálico".to_string(),
        description: "Gravidade do TCE pela escala de Glasgow e indicação de tomografia \
                      pelas regras do PECARN."
            .to_string(),
        fields: common::patient_fields(vec![
            common::glasgow(),
            FieldSpec::flag(LOSS_OF_CONSCIOUSNESS, "Perda de consciência"),
            FieldSpec::flag(SEVERE_MECHANISM, "Mecanismo de trauma grave"),
            FieldSpec::flag(VOMITING, "Vômitos"),
            FieldSpec::flag(SEVERE_HEADACHE, "Cefaleia intensa"),
            FieldSpec::flag(ALTERED_MENTAL_STATUS, "Alteração do estado mental"),
            FieldSpec::flag(PALPABLE_FRACTURE, "Fratura de crânio palpável"),
            FieldSpec::flag(BASILAR_FRACTURE, "Sinais de fratura de base de crânio"),
            FieldSpec::flag(SCALP_HEMATOMA, "Hematoma de couro cabeludo não frontal"),
            FieldSpec::flag(ACTING_ABNORMALLY, "Comportamento anormal segundo os pais"),
            FieldSpec::flag(FOCAL_DEFICIT, "Déficit neurológico focal"),
            FieldSpec::flag(SEIZURE, "Convulsão pós-traumática"),
            FieldSpec::flag(
                HERNIATION,
                "Anisocoria, postura anormal ou tríade de Cushing",
            ),
            FieldSpec::flag(COAGULOPATHY, "Coagulopatia ou uso de anticoagulante"),
            FieldSpec::flag(SUSPECTED_ABUSE, "Suspeita de maus-tratos"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("leve", "TCE leve (Glasgow 13 a 15)"),
                ("moderado", "TCE moderado (Glasgow 9 a 12)"),
                ("grave", "TCE grave (Glasgow ≤ 8)"),
            ]),
            overrides: vec![Override::new("Sinais de herniação cerebral", is(HERNIATION))],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new("Glasgow ≤ 8", at_most(GLASGOW, 8.0), "grave"),
                    LevelRule::new("Glasgow 9 a 12", at_most(GLASGOW, 12.0), "moderado"),
                    LevelRule::otherwise("Glasgow 13 a 15", "leve"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Manitol 20%",
                DoseFormula::per_kg(0.5).capped(50.0),
                DoseUnit::G,
                "IV em 20 minutos",
            )
            .concentration(200.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(is(HERNIATION)),
            MedicationRule::new(
                "Solução salina hipertônica 3%",
                DoseFormula::per_kg(5.0).capped(250.0),
                DoseUnit::Ml,
                "IV em 10 a 20 minutos",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("grave")),
            MedicationRule::new(
                "Fenitoína",
                DoseFormula::per_kg(20.0).capped(1500.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("dose de ataque")
            .concentration(50.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(any(vec![level_is("grave"), is(SEIZURE)]))
            .note("Profilaxia de crises precoces; infundir a no máximo 1 mg/kg/min"),
            common::dipyrone().when(level_is("leve")),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Imobilização da coluna cervical até avaliação",
                "Avaliação neurológica seriada com Glasgow e pupilas",
                "Manter normoxemia, normotensão e normoglicemia",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "leve",
                    &[
                        "Aplicar a regra do PECARN para decidir sobre tomografia",
                        "Analgesia e observação",
                    ],
                ),
                LevelBlock::new(
                    "moderado",
                    &[
                        "Tomografia de crânio",
                        "Avaliação do neurocirurgião",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Intubação com sequência rápida e proteção cervical",
                        "Cabeceira a 30° e alinhamento cervical",
                        "Tomografia de crânio e neurocirurgia imediatamente",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    all(vec![level_is("leve"), pecarn_high_risk()]),
                    &["Alto risco pelo PECARN: tomografia de crânio indicada"],
                ),
                ConditionalBlock::new(
                    all(vec![level_is("leve"), pecarn_intermediate_risk()]),
                    &["Risco intermediário pelo PECARN: tomografia ou observação por 4 a 6 horas"],
                ),
                ConditionalBlock::new(
                    is(SUSPECTED_ABUSE),
                    &["Suspeita de maus-tratos: notificar e acionar o serviço social"],
                ),
                ConditionalBlock::new(
                    is(COAGULOPATHY),
                    &["Coagulopatia: tomografia de crânio e correção da coagulação"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("TCE moderado ou grave", level_at_least("moderado")),
            Reason::new("Déficit neurológico focal", is(FOCAL_DEFICIT)),
            Reason::new("Convulsão pós-traumática", is(SEIZURE)),
            Reason::new("Coagulopatia", is(COAGULOPATHY)),
            Reason::new("Suspeita de maus-tratos", is(SUSPECTED_ABUSE)),
            Reason::new("Achados de alto risco pelo PECARN", pecarn_high_risk()),
        ],
        icu: Some(vec![
            Reason::new("TCE grave", level_is("grave")),
            Reason::new("Sinais de herniação", is(HERNIATION)),
        ]),
        discharge_criteria: texts(&[
            "Glasgow 15 e exame neurológico normal",
            "Tolerando a via oral",
            "Cuidador responsável orientado para observação domiciliar por 24 horas",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn glasgow_boundaries() {
        for (glasgow, expected) in [(8, "grave"), (9, "moderado"), (12, "moderado"), (13, "leve")] {
            let outcome =
                calculate_with(&definition(), &json!({ "weight": 20, "age": 6, "glasgow": glasgow }))
                    .unwrap();
            assert!(
                outcome.result().unwrap().classification.is_level(expected),
                "Glasgow {glasgow}"
            );
        }
    }

    #[test]
    fn minor_trauma_without_risk_factors_goes_home() {
        let outcome =
            calculate_with(&definition(), &json!({ "weight": 20, "age": 6, "glasgow": 15 }))
                .unwrap();
        let result = outcome.result().unwrap();
        assert!(!result.hospitalization.indicated);
        assert!(!result.discharge_criteria.is_empty());
    }
}
