//! Bacterial meningitis: empirical antibiotics by age group and adjunct
//! dexamethasone.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, GLASGOW, SYSTOLIC_BP};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{
    always, any, at_least, at_most, below, hypotensive, is, level_at_least, level_is,
};

const NECK_STIFFNESS: &str = "neckStiffness";
const BULGING_FONTANELLE: &str = "bulgingFontanelle";
const PETECHIAE: &str = "petechiae";
const SEIZURES: &str = "seizures";
const SHOCK: &str = "shock";
const CSF_BACTERIAL: &str = "bacterialCsf";
const LP_CONTRAINDICATED: &str = "lumbarPunctureContraindicated";
const IMMUNOCOMPROMISED: &str = "immunocompromised";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "meningite".to_string(),
        name: "Meningite bacteriana".to_string(),
        description: "Antibioticoterapia empírica da meningite bacteriana por faixa etária e \
                      reconhecimento de sinais de gravidade."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::flag(NECK_STIFFNESS, "Rigidez de nuca"),
            FieldSpec::flag(BULGING_FONTANELLE, "Fontanela abaulada"),
            FieldSpec::flag(PETECHIAE, "Petéquias ou púrpura"),
            FieldSpec::flag(SEIZURES, "Convulsões"),
            common::glasgow().unassessed(),
            FieldSpec::flag(SHOCK, "Sinais de choque"),
            common::systolic_bp(),
            FieldSpec::flag(CSF_BACTERIAL, "Líquor compatível com meningite bacteriana"),
            FieldSpec::flag(LP_CONTRAINDICATED, "Contraindicação à punção lombar"),
            FieldSpec::flag(IMMUNOCOMPROMISED, "Imunocomprometimento"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("suspeita", "Suspeita de meningite bacteriana"),
                ("confirmada", "Meningite bacteriana"),
                ("grave", "Meningite com sinais de gravidade"),
            ]),
            overrides: vec![Override::new(
                "Choque ou hipotensão",
                any(vec![is(SHOCK), hypotensive(SYSTOLIC_BP)]),
            )],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new("Glasgow ≤ 8", at_most(GLASGOW, 8.0), "grave"),
                    LevelRule::new("Líquor compatível", is(CSF_BACTERIAL), "confirmada"),
                    LevelRule::otherwise("Quadro clínico sugestivo", "suspeita"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Ceftriaxona",
                DoseFormula::per_kg(100.0).capped(4000.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("uma vez ao dia ou dividida a cada 12 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(at_least(AGE_MONTHS, 1.0)),
            MedicationRule::new(
                "Cefotaxima",
                DoseFormula::per_kg(200.0).capped(12000.0).divided(4),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 6 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(below(AGE_MONTHS, 1.0)),
            MedicationRule::new(
                "Ampicilina",
                DoseFormula::per_kg(300.0).capped(12000.0).divided(4),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 6 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(below(AGE_MONTHS, 3.0))
            .note("Cobertura para Listeria e Streptococcus do grupo B"),
            MedicationRule::new(
                "Vancomicina",
                DoseFormula::per_kg(60.0).capped(4000.0).divided(4),
                DoseUnit::Mg,
                "IV em 60 minutos",
            )
            .frequency("a cada 6 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(any(vec![level_at_least("confirmada"), is(IMMUNOCOMPROMISED)]))
            .note("Cobertura para pneumococo resistente; suspender conforme cultura"),
            MedicationRule::new(
                "Dexametasona",
                DoseFormula::per_kg(0.6).capped(40.0).divided(4),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 6 horas por 2 a 4 dias")
            .rounding(Rounding::Decimals { places: 1 })
            .when(at_least(AGE_MONTHS, 1.5))
            .note("Primeira dose 15 a 20 minutos antes ou junto do antibiótico"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Antibiótico imediato; não atrasar por exames",
                "Hemocultura antes do antibiótico",
                "Isolamento respiratório por 24 horas após o início do antibiótico",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "suspeita",
                    &[
                        "Punção lombar se não houver contraindicação",
                        "Iniciar antibiótico empírico após a coleta ou imediatamente se houver atraso",
                    ],
                ),
                LevelBlock::new(
                    "confirmada",
                    &[
                        "Manter antibiótico empírico até identificação do agente",
                        "Monitorar sódio e diurese (secreção inapropriada de ADH)",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Estabilização hemodinâmica e proteção de via aérea",
                        "Adiar a punção lombar até estabilização",
                        "Tratar hipertensão intracraniana",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(PETECHIAE),
                    &["Petéquias ou púrpura: suspeitar de doença meningocócica"],
                ),
                ConditionalBlock::new(
                    is(LP_CONTRAINDICATED),
                    &["Punção lombar contraindicada: colher hemocultura e iniciar antibiótico"],
                ),
                ConditionalBlock::new(
                    always(),
                    &["Quimioprofilaxia dos contactantes íntimos conforme o agente"],
                ),
            ],
        },
        hospitalization: vec![Reason::new(
            "Toda suspeita de meningite bacteriana",
            always(),
        )],
        icu: Some(vec![
            Reason::new("Meningite com sinais de gravidade", level_is("grave")),
            Reason::new("Convulsões", is(SEIZURES)),
            Reason::new("Glasgow ≤ 12", at_most(GLASGOW, 12.0)),
        ]),
        discharge_criteria: vec![],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn neonates_get_cefotaxime_and_ampicillin() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 3.5, "age": 0.5, "ageUnit": "meses" }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.dose("Cefotaxima").is_some());
        assert!(result.dose("Ampicilina").is_some());
        assert!(result.dose("Ceftriaxona").is_none());
        assert!(result.dose("Dexametasona").is_none());
        assert!(result.hospitalization.indicated);
    }
}
