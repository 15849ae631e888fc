//! Multisystem inflammatory syndrome in children temporally associated
//! with COVID-19 (SIM-P).

use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, SYSTOLIC_BP};
use crate::definition::{
    ClassificationRules, ConditionalBlock, CriterionSet, FieldSpec, Finding, LevelBlock,
    LevelRule, MedicationRule, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels,
    texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{
    all, any, at_least, hypotensive, is, level_at_least, level_is, not, unassessed,
};

const FEVER_DAYS: &str = "feverDays";
const MUCOCUTANEOUS: &str = "mucocutaneousInflammation";
const SHOCK: &str = "shock";
const CARDIAC: &str = "cardiacInvolvement";
const COAGULOPATHY: &str = "coagulopathy";
const GASTROINTESTINAL: &str = "gastrointestinalSymptoms";
const INFLAMMATORY_MARKERS: &str = "elevatedInflammatoryMarkers";
const COVID_EVIDENCE: &str = "covidEvidence";
const OTHER_CAUSE_EXCLUDED: &str = "otherCauseExcluded";
const LOW_PLATELETS: &str = "lowPlatelets";
const CORONARY_ANEURYSM: &str = "coronaryAneurysm";

pub fn definition() -> ProtocolDefinition {
    let cardiovascular_severity = any(vec![is(SHOCK), hypotensive(SYSTOLIC_BP), is(CARDIAC)]);

    ProtocolDefinition {
        id: "sim_p".to_string(),
        name: "Síndrome inflamatória multissistêmica pediátrica (SIM-P)".to_string(),
        description: "Definição de caso de SIM-P associada à COVID-19 e tratamento \
                      imunomodulador inicial."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::number(FEVER_DAYS, "Dias de febre").between(0.0, 60.0),
            FieldSpec::flag(
                MUCOCUTANEOUS,
                "Exantema, conjuntivite não purulenta ou inflamação mucocutânea",
            ),
            FieldSpec::flag(SHOCK, "Hipotensão ou choque"),
            common::systolic_bp(),
            FieldSpec::flag(
                CARDIAC,
                "Disfunção miocárdica, pericardite, valvulite ou alteração coronariana",
            ),
            FieldSpec::flag(COAGULOPATHY, "Coagulopatia (TP, TTPa ou D-dímero elevados)"),
            FieldSpec::flag(GASTROINTESTINAL, "Diarreia, vômitos ou dor abdominal agudos"),
            FieldSpec::flag(
                INFLAMMATORY_MARKERS,
                "Marcadores inflamatórios elevados (PCR, VHS ou procalcitonina)",
            )
            .unassessed(),
            FieldSpec::flag(
                COVID_EVIDENCE,
                "Evidência de COVID-19 (RT-PCR, antígeno, sorologia ou contato)",
            )
            .unassessed(),
            FieldSpec::flag(OTHER_CAUSE_EXCLUDED, "Outra causa microbiana excluída").unassessed(),
            FieldSpec::flag(LOW_PLATELETS, "Plaquetas < 80.000/mm³"),
            FieldSpec::flag(CORONARY_ANEURYSM, "Aneurisma coronariano"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("nao_preenche", "Não preenche critérios para SIM-P"),
                ("sim_p", "SIM-P"),
                ("sim_p_grave", "SIM-P com choque ou disfunção cardíaca"),
            ]),
            overrides: vec![],
            strategy: Strategy::CriteriaSets {
                prerequisites: vec![
                    Finding::new("Febre há 3 dias ou mais", at_least(FEVER_DAYS, 3.0)),
                    Finding::new("Marcadores inflamatórios elevados", is(INFLAMMATORY_MARKERS)),
                    Finding::new("Evidência de COVID-19", is(COVID_EVIDENCE)),
                    Finding::new("Outra causa microbiana excluída", is(OTHER_CAUSE_EXCLUDED)),
                ],
                sets: vec![
                    CriterionSet::new(
                        "mucocutaneo",
                        "Mucocutâneo",
                        vec![Finding::new("Inflamação mucocutânea", is(MUCOCUTANEOUS))],
                    ),
                    CriterionSet::new(
                        "choque",
                        "Hipotensão ou choque",
                        vec![
                            Finding::new("Choque", is(SHOCK)),
                            Finding::new("Hipotensão para a idade", hypotensive(SYSTOLIC_BP)),
                        ],
                    ),
                    CriterionSet::new(
                        "cardiaco",
                        "Cardíaco",
                        vec![Finding::new("Envolvimento cardíaco", is(CARDIAC))],
                    ),
                    CriterionSet::new(
                        "coagulacao",
                        "Coagulação",
                        vec![Finding::new("Coagulopatia", is(COAGULOPATHY))],
                    ),
                    CriterionSet::new(
                        "gastrointestinal",
                        "Gastrointestinal",
                        vec![Finding::new("Sintomas gastrointestinais", is(GASTROINTESTINAL))],
                    ),
                ],
                minimum: 2,
                met: "sim_p".to_string(),
                not_met: "nao_preenche".to_string(),
                escalations: vec![LevelRule::new(
                    "Choque, hipotensão ou disfunção cardíaca",
                    cardiovascular_severity,
                    "sim_p_grave",
                )],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Imunoglobulina humana IV",
                DoseFormula::per_kg(2.0).capped(100.0),
                DoseUnit::G,
                "IV em 10 a 12 horas",
            )
            .frequency("dose única")
            .rounding(Rounding::Decimals { places: 1 })
            .when(level_at_least("sim_p"))
            .note("Com disfunção cardíaca, considerar fracionar em 1 g/kg/dia por 2 dias"),
            MedicationRule::new(
                "Metilprednisolona",
                DoseFormula::per_kg(2.0).capped(60.0).divided(2),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 12 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("sim_p")),
            MedicationRule::new(
                "Metilprednisolona (pulsoterapia)",
                DoseFormula::per_kg(30.0).capped(1000.0),
                DoseUnit::Mg,
                "IV em 1 hora",
            )
            .frequency("uma vez ao dia por 3 dias")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("sim_p_grave")),
            MedicationRule::new(
                "Ácido acetilsalicílico",
                DoseFormula::per_kg(5.0).capped(100.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia")
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![level_at_least("sim_p"), not(is(LOW_PLATELETS))])),
            MedicationRule::new(
                "Enoxaparina",
                DoseFormula::per_kg(1.0).capped(80.0),
                DoseUnit::Mg,
                "SC",
            )
            .frequency("a cada 12 horas")
            .rounding(Rounding::Decimals { places: 1 })
            .when(all(vec![level_at_least("sim_p"), is(CORONARY_ANEURYSM)]))
            .note("Dose terapêutica; ajustar pelo anti-Xa"),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Ecocardiograma, ECG, troponina e BNP",
                "Hemograma, PCR, ferritina, D-dímero, fibrinogênio e função renal e hepática",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "nao_preenche",
                    &[
                        "Investigar diagnósticos diferenciais (doença de Kawasaki, sepse, viroses)",
                        "Reavaliar critérios diariamente enquanto houver febre",
                    ],
                ),
                LevelBlock::new(
                    "sim_p",
                    &[
                        "Imunoglobulina IV e corticoide",
                        "Antiagregação plaquetária com AAS em baixa dose",
                    ],
                ),
                LevelBlock::new(
                    "sim_p_grave",
                    &[
                        "Suporte hemodinâmico em UTI: cautela com volume, preferir droga vasoativa",
                        "Imunoglobulina IV e pulsoterapia com metilprednisolona",
                        "Considerar imunobiológico se refratário (anakinra, tocilizumabe)",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    any(vec![
                        unassessed(INFLAMMATORY_MARKERS),
                        unassessed(COVID_EVIDENCE),
                        unassessed(OTHER_CAUSE_EXCLUDED),
                    ]),
                    &["Investigação incompleta: completar exames antes de descartar SIM-P"],
                ),
                ConditionalBlock::new(
                    is(LOW_PLATELETS),
                    &["Plaquetopenia: suspender AAS até plaquetas > 80.000/mm³"],
                ),
                ConditionalBlock::new(
                    is(CORONARY_ANEURYSM),
                    &["Aneurisma coronariano: anticoagulação e seguimento com cardiologista"],
                ),
            ],
        },
        hospitalization: vec![Reason::new("SIM-P", level_at_least("sim_p"))],
        icu: Some(vec![Reason::new(
            "Choque ou disfunção cardíaca",
            level_is("sim_p_grave"),
        )]),
        discharge_criteria: texts(&[
            "Afebril há pelo menos 48 horas",
            "Marcadores inflamatórios em queda",
            "Ecocardiograma de controle agendado em 2 e 6 semanas",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::engine::calculate_with;

    fn confirmed(extra: Value) -> Value {
        let mut input = json!({
            "weight": 20, "age": 6, "feverDays": 4,
            "elevatedInflammatoryMarkers": true,
            "covidEvidence": true,
            "otherCauseExcluded": true
        });
        if let (Some(base), Some(extra)) = (input.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        input
    }

    #[test]
    fn two_systems_meet_the_case_definition() {
        let input = confirmed(json!({
            "mucocutaneousInflammation": true, "gastrointestinalSymptoms": true
        }));
        let outcome = calculate_with(&definition(), &input).unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("sim_p"));
        let systems: Vec<_> = result.classification.systems_involved.iter().cloned().collect();
        assert_eq!(systems, ["gastrointestinal", "mucocutaneo"]);
        assert_eq!(result.dose("Imunoglobulina humana IV").unwrap().amount, 40.0);
        assert_eq!(result.dose("Metilprednisolona").unwrap().amount, 20.0);
        assert!(result.dose("Metilprednisolona (pulsoterapia)").is_none());
        assert!(result.hospitalization.indicated);
        assert!(!result.icu_indication.as_ref().unwrap().indicated);
    }

    #[test]
    fn one_system_is_not_enough() {
        let input = confirmed(json!({ "mucocutaneousInflammation": true }));
        let outcome = calculate_with(&definition(), &input).unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("nao_preenche"));
        assert_eq!(result.classification.systems_involved.len(), 1);
        assert!(result.doses.is_empty());
        assert!(!result.discharge_criteria.is_empty());
    }

    #[test]
    fn every_prerequisite_gates_the_case_definition() {
        let systems = json!({
            "mucocutaneousInflammation": true, "gastrointestinalSymptoms": true
        });
        let gaps = [
            ("feverDays", json!(2)),
            ("elevatedInflammatoryMarkers", json!(false)),
            ("covidEvidence", json!(false)),
            ("otherCauseExcluded", json!(false)),
        ];
        for (field, value) in gaps {
            let mut input = confirmed(systems.clone());
            input[field] = value;
            let outcome = calculate_with(&definition(), &input).unwrap();
            let result = outcome.result().unwrap();
            assert!(result.classification.is_level("nao_preenche"), "{field}");
            assert_eq!(result.classification.systems_involved.len(), 2, "{field}");
        }
    }

    #[test]
    fn pending_investigation_is_flagged() {
        let input = json!({
            "weight": 20, "age": 6, "feverDays": 4,
            "mucocutaneousInflammation": true, "gastrointestinalSymptoms": true
        });
        let outcome = calculate_with(&definition(), &input).unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("nao_preenche"));
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.starts_with("Investigação incompleta"))
        );
    }

    #[test]
    fn shock_escalates_to_severe() {
        let input = confirmed(json!({
            "mucocutaneousInflammation": true, "shock": true
        }));
        let outcome = calculate_with(&definition(), &input).unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("sim_p_grave"));
        assert!(!result.classification.overridden);
        assert!(
            result
                .classification
                .contributing_criteria
                .iter()
                .any(|c| c == "Choque, hipotensão ou disfunção cardíaca")
        );
        assert_eq!(
            result.dose("Metilprednisolona (pulsoterapia)").unwrap().amount,
            600.0
        );
        assert!(result.dose("Metilprednisolona").is_none());
        assert!(result.icu_indication.as_ref().unwrap().indicated);
    }

    #[test]
    fn low_platelets_withhold_aspirin() {
        let input = confirmed(json!({
            "mucocutaneousInflammation": true, "cardiacInvolvement": true,
            "lowPlatelets": true
        }));
        let outcome = calculate_with(&definition(), &input).unwrap();
        let result = outcome.result().unwrap();

        assert!(result.classification.is_level("sim_p_grave"));
        assert!(result.dose("Ácido acetilsalicílico").is_none());
    }
}
