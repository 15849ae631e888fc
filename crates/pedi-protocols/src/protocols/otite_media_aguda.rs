//! Acute otitis media: severity, antibiotic-or-observation decision and
//! amoxicillin-based regimens.
//!
//! No ICU statement.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, TEMPERATURE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{Predicate, above, all, any, at_least, below, eq, is, level_is, not};

const OTALGIA: &str = "otalgia";
const BILATERAL: &str = "bilateral";
const OTORRHEA: &str = "otorrhea";
const RECENT_AMOXICILLIN: &str = "amoxicillinLast30Days";
const CONJUNCTIVITIS: &str = "purulentConjunctivitis";
const PENICILLIN_ALLERGY: &str = "penicillinAllergy";
const FOLLOW_UP: &str = "followUpAssured";
const MASTOIDITIS: &str = "mastoiditisSigns";

fn antibiotic_indicated() -> Predicate {
    any(vec![
        level_is("grave"),
        is(OTORRHEA),
        below(AGE_MONTHS, 6.0),
        all(vec![below(AGE_MONTHS, 24.0), is(BILATERAL)]),
        not(is(FOLLOW_UP)),
    ])
}

pub fn definition() -> ProtocolDefinition {
    let resistant_risk = any(vec![is(RECENT_AMOXICILLIN), is(CONJUNCTIVITIS)]);

    ProtocolDefinition {
        id: "otite_media_aguda".to_string(),
        name: "Otite média aguda".to_string(),
        description: "Gravidade da otite média aguda e decisão entre antibiótico e \
                      observação vigiada."
            .to_string(),
        fields: common::patient_fields(vec![
            common::temperature(),
            FieldSpec::choice(OTALGIA, "Otalgia", &["leve", "moderada_grave"])
                .defaults_to_option("leve"),
            FieldSpec::flag(BILATERAL, "Acometimento bilateral"),
            FieldSpec::flag(OTORRHEA, "Otorreia"),
            FieldSpec::flag(RECENT_AMOXICILLIN, "Uso de amoxicilina nos últimos 30 dias"),
            FieldSpec::flag(CONJUNCTIVITIS, "Conjuntivite purulenta associada"),
            FieldSpec::flag(PENICILLIN_ALLERGY, "Alergia a penicilina"),
            FieldSpec::flag(FOLLOW_UP, "Reavaliação garantida em 48 a 72 horas"),
            FieldSpec::flag(MASTOIDITIS, "Sinais de mastoidite"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("nao_grave", "Otite média aguda não grave"),
                ("grave", "Otite média aguda grave"),
            ]),
            overrides: vec![],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Otalgia moderada a grave ou temperatura ≥ 39 °C",
                        any(vec![eq(OTALGIA, "moderada_grave"), at_least(TEMPERATURE, 39.0)]),
                        "grave",
                    ),
                    LevelRule::otherwise("Otalgia leve e temperatura < 39 °C", "nao_grave"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Amoxicilina",
                DoseFormula::per_kg(90.0).capped(4000.0).divided(2),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 12 horas por 10 dias (5 a 7 dias se 6 anos ou mais)")
            .concentration(400.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![
                antibiotic_indicated(),
                not(resistant_risk.clone()),
                not(is(PENICILLIN_ALLERGY)),
            ])),
            MedicationRule::new(
                "Amoxicilina + clavulanato",
                DoseFormula::per_kg(90.0).capped(4000.0).divided(2),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 12 horas por 10 dias")
            .concentration(400.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![
                antibiotic_indicated(),
                resistant_risk,
                not(is(PENICILLIN_ALLERGY)),
            ]))
            .note("Dose expressa em amoxicilina"),
            MedicationRule::new(
                "Azitromicina",
                DoseFormula::per_kg(10.0).capped(500.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia por 3 dias")
            .concentration(200.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![antibiotic_indicated(), is(PENICILLIN_ALLERGY)])),
            common::ibuprofen(),
            common::paracetamol().when(below(AGE_MONTHS, 6.0)),
        ],
        recommendations: RecommendationRules {
            general: texts(&["Analgesia em todos os casos"]),
            by_level: vec![
                LevelBlock::new(
                    "nao_grave",
                    &["Antibiótico ou observação vigiada conforme idade e lateralidade"],
                ),
                LevelBlock::new("grave", &["Antibiótico imediato"]),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    not(antibiotic_indicated()),
                    &[
                        "Observação vigiada: analgesia e reavaliação em 48 a 72 horas",
                        "Iniciar antibiótico se não houver melhora",
                    ],
                ),
                ConditionalBlock::new(
                    above(TEMPERATURE, 38.0),
                    &["Febre: antitérmico conforme necessidade"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Sinais de mastoidite", is(MASTOIDITIS)),
            Reason::new(
                "Lactente menor de 2 meses febril",
                all(vec![below(AGE_MONTHS, 2.0), above(TEMPERATURE, 38.0)]),
            ),
        ],
        icu: None,
        discharge_criteria: texts(&[
            "Dor controlada com analgésico oral",
            "Cuidadores orientados quanto à reavaliação em 48 a 72 horas",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn mild_unilateral_in_older_child_may_be_observed() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 20, "age": 5, "followUpAssured": true }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.dose("Amoxicilina").is_none());
        assert!(result.recommendations.iter().any(|r| r.starts_with("Observação vigiada")));
    }

    #[test]
    fn high_dose_amoxicillin_split_in_two() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 10, "age": 18, "ageUnit": "meses", "bilateral": true }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        let amoxicillin = result.dose("Amoxicilina").unwrap();
        assert_eq!(amoxicillin.amount, 450.0);
        assert_eq!(amoxicillin.volume.as_ref().unwrap().ml, 5.6);
    }
}
