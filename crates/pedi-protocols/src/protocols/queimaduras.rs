//! Burns: size and depth classification, Parkland resuscitation and
//! analgesia.

use pedi_core::units::{DoseUnit, Rounding};

use super::common;
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{above, all, any, at_least, below, eq, is, level_at_least, level_is, one_of};
use crate::validate::WEIGHT;

pub const BURNED_SURFACE: &str = "burnedSurfacePercent";
const DEPTH: &str = "burnDepth";
const SPECIAL_AREAS: &str = "specialAreas";
const INHALATION: &str = "inhalationInjury";
const ELECTRICAL: &str = "highVoltageElectrical";
const CIRCUMFERENTIAL: &str = "circumferential";
const SUSPECTED_ABUSE: &str = "suspectedAbuse";
const ASSOCIATED_TRAUMA: &str = "associatedTrauma";

pub const PARKLAND: &str = "Ringer lactato (Parkland, 24 horas)";

pub fn definition() -> ProtocolDefinition {
    let needs_resuscitation = at_least(BURNED_SURFACE, 10.0);

    ProtocolDefinition {
        id: "queimaduras".to_string(),
        name: "Queimaduras".to_string(),
        description: "Classificação do queimado pela extensão e profundidade e reposição \
                      volêmica pela fórmula de Parkland."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::number(BURNED_SURFACE, "Superfície corporal queimada de 2º e 3º graus (%)")
                .between(0.0, 100.0),
            FieldSpec::choice(
                DEPTH,
                "Profundidade predominante",
                &["primeiro", "segundo_superficial", "segundo_profundo", "terceiro"],
            ),
            FieldSpec::flag(SPECIAL_AREAS, "Face, mãos, pés, genitália, períneo ou articulações"),
            FieldSpec::flag(INHALATION, "Suspeita de lesão inalatória"),
            FieldSpec::flag(ELECTRICAL, "Queimadura elétrica de alta voltagem"),
            FieldSpec::flag(CIRCUMFERENTIAL, "Queimadura circunferencial"),
            FieldSpec::flag(SUSPECTED_ABUSE, "Suspeita de maus-tratos"),
            FieldSpec::flag(ASSOCIATED_TRAUMA, "Trauma associado"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("pequeno", "Pequeno queimado"),
                ("medio", "Médio queimado"),
                ("grande", "Grande queimado"),
            ]),
            overrides: vec![
                Override::new("Lesão inalatória", is(INHALATION)),
                Override::new("Queimadura elétrica de alta voltagem", is(ELECTRICAL)),
            ],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "2º grau ≥ 15% ou 3º grau ≥ 10%",
                        any(vec![
                            all(vec![
                                at_least(BURNED_SURFACE, 15.0),
                                one_of(DEPTH, &["segundo_superficial", "segundo_profundo"]),
                            ]),
                            all(vec![at_least(BURNED_SURFACE, 10.0), eq(DEPTH, "terceiro")]),
                        ]),
                        "grande",
                    ),
                    LevelRule::new(
                        "2º grau entre 5% e 15% ou qualquer 3º grau",
                        any(vec![
                            all(vec![
                                at_least(BURNED_SURFACE, 5.0),
                                one_of(DEPTH, &["segundo_superficial", "segundo_profundo"]),
                            ]),
                            all(vec![above(BURNED_SURFACE, 0.0), eq(DEPTH, "terceiro")]),
                        ]),
                        "medio",
                    ),
                    LevelRule::otherwise("2º grau < 5% ou 1º grau", "pequeno"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                PARKLAND,
                DoseFormula::per_kg(4.0).per_field(BURNED_SURFACE),
                DoseUnit::Ml,
                "IV",
            )
            .frequency("metade nas primeiras 8 horas a partir da queimadura, metade nas 16 seguintes")
            .rounding(Rounding::Decimals { places: 0 })
            .when(needs_resuscitation.clone()),
            MedicationRule::new(
                "Ringer lactato (primeiras 8 horas)",
                DoseFormula::per_kg(4.0).per_field(BURNED_SURFACE).scaled(0.5),
                DoseUnit::Ml,
                "IV",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(needs_resuscitation.clone()),
            MedicationRule::new(
                "Soro de manutenção com glicose (Holliday-Segar)",
                DoseFormula::holliday_segar().divided(24),
                DoseUnit::MlPerHour,
                "IV",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![needs_resuscitation, below(WEIGHT, 30.0)]))
            .note("Em crianças com menos de 30 kg, somar ao volume de Parkland"),
            common::dipyrone(),
            MedicationRule::new(
                "Morfina",
                DoseFormula::per_kg(0.1).capped(5.0),
                DoseUnit::Mg,
                "IV lento",
            )
            .frequency("a cada 4 horas, se necessário")
            .concentration(1.0, 1.0)
            .rounding(Rounding::Decimals { places: 2 })
            .when(level_at_least("medio"))
            .note("Diluir para 1 mg/mL; titular pela dor e pela frequência respiratória"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Interromper o processo de queimadura e resfriar com água corrente por 20 minutos",
                "Remover roupas e adornos",
                "Cobrir com compressas limpas e prevenir hipotermia",
                "Verificar a vacinação antitetânica",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "pequeno",
                    &[
                        "Limpeza com água e sabão neutro e curativo",
                        "Acompanhamento ambulatorial",
                    ],
                ),
                LevelBlock::new(
                    "medio",
                    &[
                        "Acesso venoso e analgesia adequada",
                        "Controle de diurese",
                    ],
                ),
                LevelBlock::new(
                    "grande",
                    &[
                        "Reposição volêmica pela fórmula de Parkland",
                        "Sonda vesical com meta de diurese de 1 mL/kg/h",
                        "Transferência para centro de tratamento de queimados",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(INHALATION),
                    &["Lesão inalatória: avaliar intubação precoce antes do edema de via aérea"],
                ),
                ConditionalBlock::new(
                    is(CIRCUMFERENTIAL),
                    &["Queimadura circunferencial: avaliar escarotomia"],
                ),
                ConditionalBlock::new(
                    is(ELECTRICAL),
                    &["Queimadura elétrica: ECG e monitorização cardíaca, pesquisar rabdomiólise"],
                ),
                ConditionalBlock::new(
                    is(SUSPECTED_ABUSE),
                    &["Suspeita de maus-tratos: notificar e acionar o serviço social"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Médio ou grande queimado", level_at_least("medio")),
            Reason::new("Queimadura em áreas especiais", is(SPECIAL_AREAS)),
            Reason::new("Queimadura circunferencial", is(CIRCUMFERENTIAL)),
            Reason::new("Suspeita de maus-tratos", is(SUSPECTED_ABUSE)),
            Reason::new("Trauma associado", is(ASSOCIATED_TRAUMA)),
        ],
        icu: Some(vec![
            Reason::new("Grande queimado", level_is("grande")),
            Reason::new("Lesão inalatória", is(INHALATION)),
        ]),
        discharge_criteria: texts(&[
            "Dor controlada com analgesia oral",
            "Curativo orientado e retorno agendado em 48 horas",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn parkland_uses_weight_and_burned_surface() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 20, "age": 6, "burnedSurfacePercent": 20,
                "burnDepth": "segundo_profundo"
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("grande"));
        assert_eq!(result.dose(PARKLAND).unwrap().amount, 1600.0);
        assert_eq!(result.dose("Ringer lactato (primeiras 8 horas)").unwrap().amount, 800.0);
        assert_eq!(
            result.dose("Soro de manutenção com glicose (Holliday-Segar)").unwrap().amount,
            63.0
        );
    }
}
