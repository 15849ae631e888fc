//! Diabetic ketoacidosis: biochemical severity, fluid and insulin
//! infusion, and cerebral edema watch.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, GLASGOW, GLUCOSE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{above, all, any, at_least, below, is, level_at_least, level_is, not};

const PH: &str = "ph";
const BICARBONATE: &str = "bicarbonate";
const POTASSIUM: &str = "potassium";
const SHOCK: &str = "shock";
const CEREBRAL_EDEMA: &str = "cerebralEdemaSigns";
const NEW_DIAGNOSIS: &str = "newDiagnosis";

pub fn definition() -> ProtocolDefinition {
    let diagnostic = all(vec![
        above(GLUCOSE, 200.0),
        any(vec![below(PH, 7.3), below(BICARBONATE, 15.0)]),
    ]);

    ProtocolDefinition {
        id: "cetoacidose_diabetica".to_string(),
        name: "Cetoacidose diabética".to_string(),
        description: "Classificação bioquímica da cetoacidose, hidratação, insulina em \
                      infusão contínua e vigilância de edema cerebral."
            .to_string(),
        fields: common::patient_fields(vec![
            common::glucose(),
            FieldSpec::number(PH, "pH venoso").between(6.5, 7.8),
            FieldSpec::number(BICARBONATE, "Bicarbonato (mEq/L)").between(0.0, 40.0),
            FieldSpec::number(POTASSIUM, "Potássio (mEq/L)")
                .between(1.0, 10.0)
                .unassessed(),
            common::glasgow().unassessed(),
            FieldSpec::flag(SHOCK, "Sinais de choque"),
            FieldSpec::flag(
                CEREBRAL_EDEMA,
                "Cefaleia intensa, bradicardia, hipertensão ou piora neurológica",
            ),
            FieldSpec::flag(NEW_DIAGNOSIS, "Diabetes recém-diagnosticado"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("sem_cad", "Sem critérios de cetoacidose"),
                ("leve", "Cetoacidose leve"),
                ("moderada", "Cetoacidose moderada"),
                ("grave", "Cetoacidose grave"),
            ]),
            overrides: vec![
                Override::new("Sinais de edema cerebral", is(CEREBRAL_EDEMA)),
                Override::new("Choque", all(vec![diagnostic.clone(), is(SHOCK)])),
            ],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Glicemia ≤ 200 mg/dL ou sem acidose",
                        not(diagnostic),
                        "sem_cad",
                    ),
                    LevelRule::new(
                        "pH < 7,1 ou bicarbonato < 5 mEq/L",
                        any(vec![below(PH, 7.1), below(BICARBONATE, 5.0)]),
                        "grave",
                    ),
                    LevelRule::new(
                        "pH < 7,2 ou bicarbonato < 10 mEq/L",
                        any(vec![below(PH, 7.2), below(BICARBONATE, 10.0)]),
                        "moderada",
                    ),
                    LevelRule::otherwise("pH < 7,3 ou bicarbonato < 15 mEq/L", "leve"),
                ],
            },
        },
        medications: vec![
            common::saline_bolus("Soro fisiológico 0,9% (expansão)", 10.0)
                .frequency("em 30 a 60 minutos")
                .when(all(vec![level_at_least("leve"), not(is(SHOCK))])),
            common::saline_bolus("Soro fisiológico 0,9% (choque)", 20.0)
                .frequency("em bolus; repetir até restaurar a perfusão")
                .when(is(SHOCK)),
            MedicationRule::new(
                "Insulina regular (0,05 UI/kg/h)",
                DoseFormula::per_kg(0.05),
                DoseUnit::UiPerHour,
                "IV contínuo",
            )
            .rounding(Rounding::Decimals { places: 2 })
            .when(level_is("leve"))
            .note("Iniciar 1 hora após o início da hidratação; sem bolus"),
            MedicationRule::new(
                "Insulina regular (0,1 UI/kg/h)",
                DoseFormula::per_kg(0.1),
                DoseUnit::UiPerHour,
                "IV contínuo",
            )
            .rounding(Rounding::Decimals { places: 2 })
            .when(level_at_least("moderada"))
            .note("Iniciar 1 hora após o início da hidratação; sem bolus"),
            MedicationRule::new(
                "Manitol 20%",
                DoseFormula::per_kg(0.5).capped(50.0),
                DoseUnit::G,
                "IV em 10 a 15 minutos",
            )
            .concentration(200.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(is(CEREBRAL_EDEMA)),
            MedicationRule::new(
                "Solução salina hipertônica 3%",
                DoseFormula::per_kg(5.0).capped(250.0),
                DoseUnit::Ml,
                "IV em 10 a 15 minutos",
            )
            .rounding(Rounding::Decimals { places: 0 })
            .when(is(CEREBRAL_EDEMA))
            .note("Alternativa ao manitol"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Glicemia capilar a cada hora; eletrólitos e gasometria a cada 2 a 4 horas",
                "Balanço hídrico rigoroso",
                "Avaliação neurológica seriada",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "sem_cad",
                    &[
                        "Corrigir hiperglicemia com insulina subcutânea",
                        "Investigar cetonemia e causa da descompensação",
                    ],
                ),
                LevelBlock::new(
                    "leve",
                    &[
                        "Reposição do déficit em 48 horas com solução isotônica",
                        "Insulina em infusão contínua de 0,05 UI/kg/h",
                    ],
                ),
                LevelBlock::new(
                    "moderada",
                    &[
                        "Reposição do déficit em 48 horas com solução isotônica",
                        "Insulina em infusão contínua de 0,1 UI/kg/h",
                        "Adicionar glicose ao soro quando glicemia < 250 mg/dL",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Monitorização em UTI",
                        "Insulina em infusão contínua de 0,1 UI/kg/h",
                        "Não usar bicarbonato de rotina",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    below(POTASSIUM, 3.5),
                    &["Hipocalemia: repor potássio antes de iniciar a insulina"],
                ),
                ConditionalBlock::new(
                    all(vec![at_least(POTASSIUM, 3.5), below(POTASSIUM, 5.5)]),
                    &["Adicionar 40 mEq/L de potássio ao soro após a expansão"],
                ),
                ConditionalBlock::new(
                    is(CEREBRAL_EDEMA),
                    &[
                        "Edema cerebral: cabeceira a 30°, reduzir a infusão de fluidos e tratar imediatamente",
                    ],
                ),
                ConditionalBlock::new(
                    is(NEW_DIAGNOSIS),
                    &["Diabetes recém-diagnosticado: educação em diabetes antes da alta"],
                ),
            ],
        },
        hospitalization: vec![Reason::new("Cetoacidose diabética", level_at_least("leve"))],
        icu: Some(vec![
            Reason::new("Cetoacidose grave", level_is("grave")),
            Reason::new(
                "Idade menor que 5 anos",
                all(vec![level_at_least("moderada"), below(AGE_MONTHS, 60.0)]),
            ),
            Reason::new("Sinais de edema cerebral", is(CEREBRAL_EDEMA)),
            Reason::new("Glasgow < 14", below(GLASGOW, 14.0)),
        ]),
        discharge_criteria: texts(&[
            "Sem acidose e com cetonemia negativa",
            "Aceitação da dieta e esquema de insulina subcutânea definido",
            "Cuidadores treinados em monitorização e aplicação de insulina",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    fn level(glucose: f64, ph: f64, bicarbonate: f64) -> String {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 30, "age": 10, "glucose": glucose, "ph": ph,
                "bicarbonate": bicarbonate
            }),
        )
        .unwrap();
        outcome.result().unwrap().classification.level.id.clone()
    }

    #[test]
    fn severity_follows_ph_and_bicarbonate() {
        assert_eq!(level(180.0, 7.25, 12.0), "sem_cad");
        assert_eq!(level(450.0, 7.35, 18.0), "sem_cad");
        assert_eq!(level(450.0, 7.25, 14.0), "leve");
        assert_eq!(level(450.0, 7.15, 12.0), "moderada");
        assert_eq!(level(450.0, 7.05, 8.0), "grave");
    }

    #[test]
    fn mannitol_volume_from_grams() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 20, "age": 8, "glucose": 500, "ph": 7.0,
                "bicarbonate": 4, "cerebralEdemaSigns": true
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        let mannitol = result.dose("Manitol 20%").unwrap();
        assert_eq!(mannitol.amount, 10.0);
        assert_eq!(mannitol.volume.as_ref().unwrap().ml, 50.0);
    }
}
