//! Urinary tract infection: cystitis, febrile UTI and complicated UTI.
//!
//! Makes no ICU statement: unstable patients are handled by the sepsis
//! protocol.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, TEMPERATURE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{
    all, any, at_least, at_most, below, is, level_at_least, level_is, unassessed,
};

const TOXIC_APPEARANCE: &str = "toxicAppearance";
const ORAL_INTOLERANCE: &str = "oralIntolerance";
const DEHYDRATION: &str = "dehydration";
const IMMUNOSUPPRESSION: &str = "immunosuppression";
const KNOWN_UROPATHY: &str = "knownUropathy";
const LOWER_TRACT_ONLY: &str = "lowerTractSymptomsOnly";
const NO_FOLLOW_UP: &str = "noFollowUp";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "itu".to_string(),
        name: "Infecção do trato urinário".to_string(),
        description: "Classificação da ITU e escolha da via e do antibiótico.".to_string(),
        fields: common::patient_fields(vec![
            common::temperature(),
            FieldSpec::flag(TOXIC_APPEARANCE, "Aspecto toxêmico"),
            FieldSpec::flag(ORAL_INTOLERANCE, "Vômitos ou intolerância à via oral"),
            FieldSpec::flag(DEHYDRATION, "Desidratação"),
            FieldSpec::flag(IMMUNOSUPPRESSION, "Imunossupressão"),
            FieldSpec::flag(KNOWN_UROPATHY, "Uropatia ou malformação urinária conhecida"),
            FieldSpec::flag(
                LOWER_TRACT_ONLY,
                "Sintomas restritos ao trato urinário baixo (disúria, polaciúria)",
            ),
            FieldSpec::flag(NO_FOLLOW_UP, "Impossibilidade de seguimento ambulatorial"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("cistite", "Cistite"),
                ("pielonefrite", "ITU febril / pielonefrite"),
                ("complicada", "ITU com critério de internação"),
            ]),
            overrides: vec![],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Toxemia, idade < 3 meses, intolerância oral, desidratação ou imunossupressão",
                        any(vec![
                            is(TOXIC_APPEARANCE),
                            below(AGE_MONTHS, 3.0),
                            is(ORAL_INTOLERANCE),
                            is(DEHYDRATION),
                            is(IMMUNOSUPPRESSION),
                        ]),
                        "complicada",
                    ),
                    LevelRule::new(
                        "Sintomas baixos com temperatura aferida ≤ 38 °C",
                        all(vec![is(LOWER_TRACT_ONLY), at_most(TEMPERATURE, 38.0)]),
                        "cistite",
                    ),
                    LevelRule::otherwise("ITU febril ou sem localização", "pielonefrite"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Cefalexina",
                DoseFormula::per_kg(50.0).capped(2000.0).divided(4),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 6 horas por 3 a 5 dias")
            .concentration(250.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("cistite")),
            MedicationRule::new(
                "Cefuroxima axetil",
                DoseFormula::per_kg(30.0).capped(1000.0).divided(2),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 12 horas por 7 a 10 dias")
            .concentration(250.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("pielonefrite")),
            MedicationRule::new(
                "Ceftriaxona",
                DoseFormula::per_kg(75.0).capped(2000.0),
                DoseUnit::Mg,
                "IV ou IM",
            )
            .frequency("uma vez ao dia")
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![level_is("complicada"), at_least(AGE_MONTHS, 1.0)])),
            MedicationRule::new(
                "Ampicilina",
                DoseFormula::per_kg(150.0).divided(3),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 8 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![level_is("complicada"), below(AGE_MONTHS, 1.0)])),
            MedicationRule::new("Gentamicina", DoseFormula::per_kg(5.0), DoseUnit::Mg, "IV")
            .frequency("uma vez ao dia")
            .rounding(Rounding::Decimals { places: 1 })
            .when(all(vec![level_is("complicada"), below(AGE_MONTHS, 1.0)]))
            .note("Ajustar pela função renal"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Urocultura por método confiável antes do antibiótico",
                "Ajustar o antibiótico conforme o antibiograma",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "cistite",
                    &["Tratamento oral de curta duração", "Hidratação e micções frequentes"],
                ),
                LevelBlock::new(
                    "pielonefrite",
                    &[
                        "Tratamento oral ambulatorial por 7 a 10 dias",
                        "Reavaliação em 48 a 72 horas",
                    ],
                ),
                LevelBlock::new(
                    "complicada",
                    &[
                        "Antibiótico parenteral até melhora clínica",
                        "Hemocultura e função renal",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    all(vec![level_at_least("pielonefrite"), below(AGE_MONTHS, 24.0)]),
                    &["Primeira ITU febril em menor de 2 anos: ultrassonografia de rins e vias urinárias"],
                ),
                ConditionalBlock::new(
                    all(vec![is(LOWER_TRACT_ONLY), unassessed(TEMPERATURE)]),
                    &["Temperatura não aferida: tratado como ITU febril até medição"],
                ),
                ConditionalBlock::new(
                    is(KNOWN_UROPATHY),
                    &["Uropatia conhecida: acompanhamento com nefrologia ou urologia pediátrica"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("ITU complicada", level_is("complicada")),
            Reason::new("Impossibilidade de seguimento ambulatorial", is(NO_FOLLOW_UP)),
        ],
        icu: None,
        discharge_criteria: texts(&[
            "Afebril ou em melhora clínica",
            "Tolerando antibiótico oral",
            "Retorno com resultado da urocultura",
        ]),
    }
}
