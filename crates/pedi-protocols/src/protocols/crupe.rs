//! Croup (viral laryngotracheitis), graded with the Westley score.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common;
use crate::definition::{
    ClassificationRules, ConditionalBlock, Criterion, FieldSpec, LevelBlock, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, Threshold, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{below, eq, is, level_at_least, level_is, one_of};

const STRIDOR: &str = "stridor";
const RETRACTIONS: &str = "retractions";
const AIR_ENTRY: &str = "airEntry";
const CYANOSIS: &str = "cyanosis";
const CONSCIOUSNESS: &str = "consciousness";
const REPEATED_ADRENALINE: &str = "repeatedNebulizedAdrenaline";
const TOXIC_APPEARANCE: &str = "toxicAppearance";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "crupe".to_string(),
        name: "Crupe viral".to_string(),
        description: "Escore de Westley para laringotraqueíte viral e tratamento com \
                      corticoide e adrenalina nebulizada."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::choice(STRIDOR, "Estridor", &["ausente", "agitacao", "repouso"]),
            FieldSpec::choice(
                RETRACTIONS,
                "Retrações",
                &["ausente", "leve", "moderada", "grave"],
            ),
            FieldSpec::choice(AIR_ENTRY, "Entrada de ar", &["normal", "diminuida", "muito_diminuida"])
                .defaults_to_option("normal"),
            FieldSpec::choice(CYANOSIS, "Cianose em ar ambiente", &["ausente", "agitacao", "repouso"])
                .defaults_to_option("ausente"),
            FieldSpec::choice(CONSCIOUSNESS, "Nível de consciência", &["normal", "desorientado"])
                .defaults_to_option("normal"),
            FieldSpec::flag(
                REPEATED_ADRENALINE,
                "Necessidade de duas ou mais nebulizações com adrenalina",
            ),
            FieldSpec::flag(TOXIC_APPEARANCE, "Aspecto toxêmico ou febre alta"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("leve", "Crupe leve (Westley ≤ 2)"),
                ("moderado", "Crupe moderado (Westley 3 a 5)"),
                ("grave", "Crupe grave (Westley 6 a 11)"),
                ("insuficiencia_iminente", "Insuficiência respiratória iminente (Westley ≥ 12)"),
            ]),
            overrides: vec![],
            strategy: Strategy::Scored {
                criteria: vec![
                    Criterion::new("Estridor à agitação", eq(STRIDOR, "agitacao"), 1.0),
                    Criterion::new("Estridor em repouso", eq(STRIDOR, "repouso"), 2.0),
                    Criterion::new("Retrações leves", eq(RETRACTIONS, "leve"), 1.0),
                    Criterion::new("Retrações moderadas", eq(RETRACTIONS, "moderada"), 2.0),
                    Criterion::new("Retrações graves", eq(RETRACTIONS, "grave"), 3.0),
                    Criterion::new("Entrada de ar diminuída", eq(AIR_ENTRY, "diminuida"), 1.0),
                    Criterion::new(
                        "Entrada de ar muito diminuída",
                        eq(AIR_ENTRY, "muito_diminuida"),
                        2.0,
                    ),
                    Criterion::new("Cianose à agitação", eq(CYANOSIS, "agitacao"), 4.0),
                    Criterion::new("Cianose em repouso", eq(CYANOSIS, "repouso"), 5.0),
                    Criterion::new("Desorientação", eq(CONSCIOUSNESS, "desorientado"), 5.0),
                ],
                thresholds: vec![
                    Threshold::new(0.0, "leve"),
                    Threshold::new(3.0, "moderado"),
                    Threshold::new(6.0, "grave"),
                    Threshold::new(12.0, "insuficiencia_iminente"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Dexametasona (dose baixa)",
                DoseFormula::per_kg(0.15).capped(10.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("dose única")
            .rounding(Rounding::Decimals { places: 1 })
            .when(level_is("leve")),
            MedicationRule::new(
                "Dexametasona",
                DoseFormula::per_kg(0.6).capped(10.0),
                DoseUnit::Mg,
                "VO ou IM",
            )
            .frequency("dose única")
            .rounding(Rounding::Decimals { places: 1 })
            .when(level_at_least("moderado")),
            MedicationRule::new(
                "Adrenalina nebulizada (1 mg/mL)",
                DoseFormula::per_kg(0.5).capped(5.0),
                DoseUnit::Ml,
                "nebulização",
            )
            .frequency("pode repetir a cada 20 minutos se necessário")
            .rounding(Rounding::Decimals { places: 1 })
            .when(level_at_least("moderado"))
            .note("Sem diluição; observar por 2 a 4 horas pelo risco de efeito rebote"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Manter a criança no colo dos cuidadores, evitando agitação",
                "Não examinar a orofaringe com abaixador de língua se houver sinais de gravidade",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "leve",
                    &[
                        "Corticoide oral em dose única e alta com orientações",
                        "Retornar se estridor em repouso ou dificuldade para respirar",
                    ],
                ),
                LevelBlock::new(
                    "moderado",
                    &[
                        "Dexametasona e adrenalina nebulizada",
                        "Observar por 2 a 4 horas após a última adrenalina",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Adrenalina nebulizada e dexametasona imediatamente",
                        "Oxigênio se hipoxemia",
                        "Internação",
                    ],
                ),
                LevelBlock::new(
                    "insuficiencia_iminente",
                    &[
                        "Acionar equipe de via aérea avançada",
                        "Intubação com cânula 0,5 mm menor que a prevista para a idade",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(TOXIC_APPEARANCE),
                    &["Aspecto toxêmico: considerar traqueíte bacteriana ou epiglotite"],
                ),
                ConditionalBlock::new(
                    below(AGE_MONTHS, 6.0),
                    &["Menor de 6 meses: investigar causas estruturais de estridor"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Crupe grave", level_at_least("grave")),
            Reason::new("Necessidade de nebulizações repetidas com adrenalina", is(REPEATED_ADRENALINE)),
            Reason::new("Idade menor que 6 meses", below(AGE_MONTHS, 6.0)),
            Reason::new("Aspecto toxêmico", is(TOXIC_APPEARANCE)),
        ],
        icu: Some(vec![
            Reason::new("Insuficiência respiratória iminente", level_is("insuficiencia_iminente")),
            Reason::new("Cianose", one_of(CYANOSIS, &["agitacao", "repouso"])),
        ]),
        discharge_criteria: texts(&[
            "Sem estridor em repouso após 2 a 4 horas da última adrenalina",
            "Boa aceitação oral",
            "Cuidadores orientados sobre sinais de alarme",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn westley_score_is_summed() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 12, "age": 2, "stridor": "repouso", "retractions": "moderada",
                "airEntry": "diminuida"
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.classification.score, Some(5.0));
        assert!(result.classification.is_level("moderado"));
        assert_eq!(result.dose("Dexametasona").unwrap().amount, 7.2);
    }
}
