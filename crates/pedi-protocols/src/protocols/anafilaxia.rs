//! Anaphylaxis: multi-system involvement after exposure to a likely
//! allergen, with intramuscular adrenaline as first-line treatment.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, SPO2, SYSTOLIC_BP};
use crate::definition::{
    ClassificationRules, ConditionalBlock, CriterionSet, FieldSpec, Finding, LevelBlock,
    LevelRule, MedicationRule, Override, ProtocolDefinition, Reason, RecommendationRules,
    Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{
    all, any, at_least, below, hypotensive, is, level_at_least, level_is, system,
};

const EXPOSURE: &str = "allergenExposure";
const URTICARIA: &str = "urticaria";
const ANGIOEDEMA: &str = "angioedema";
const DYSPNEA: &str = "dyspnea";
const BRONCHOSPASM: &str = "bronchospasm";
const STRIDOR: &str = "stridor";
const HYPOTENSION: &str = "hypotension";
const SYNCOPE: &str = "syncope";
const VOMITING: &str = "persistentVomiting";
const ABDOMINAL_PAIN: &str = "abdominalPain";
const ALTERED_CONSCIOUSNESS: &str = "alteredConsciousness";
const ASTHMA: &str = "asthmaHistory";
const PREVIOUS_ANAPHYLAXIS: &str = "previousAnaphylaxis";

pub const ADRENALINE: &str = "Adrenalina IM";

pub fn definition() -> ProtocolDefinition {
    let shock = any(vec![is(HYPOTENSION), hypotensive(SYSTOLIC_BP)]);

    ProtocolDefinition {
        id: "anafilaxia".to_string(),
        name: "Anafilaxia".to_string(),
        description: "Reconhecimento de anafilaxia por envolvimento de múltiplos sistemas \
                      após exposição a alérgeno e tratamento com adrenalina intramuscular."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::flag(EXPOSURE, "Exposição a alérgeno provável ou conhecido"),
            FieldSpec::flag(URTICARIA, "Urticária generalizada, prurido ou rubor"),
            FieldSpec::flag(ANGIOEDEMA, "Angioedema de lábios, língua ou úvula"),
            FieldSpec::flag(DYSPNEA, "Dispneia"),
            FieldSpec::flag(BRONCHOSPASM, "Sibilância ou broncoespasmo"),
            FieldSpec::flag(STRIDOR, "Estridor"),
            common::oxygen_saturation(),
            FieldSpec::flag(HYPOTENSION, "Hipotensão ou sinais de choque"),
            common::systolic_bp(),
            FieldSpec::flag(SYNCOPE, "Síncope, hipotonia ou incontinência"),
            FieldSpec::flag(VOMITING, "Vômitos persistentes"),
            FieldSpec::flag(ABDOMINAL_PAIN, "Dor abdominal intensa em cólica"),
            FieldSpec::flag(ALTERED_CONSCIOUSNESS, "Alteração do nível de consciência"),
            FieldSpec::flag(ASTHMA, "Asma"),
            FieldSpec::flag(PREVIOUS_ANAPHYLAXIS, "Anafilaxia prévia"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("sem_criterios", "Reação alérgica sem critérios de anafilaxia"),
                ("anafilaxia", "Anafilaxia"),
                ("anafilaxia_grave", "Anafilaxia grave"),
                ("choque_anafilatico", "Choque anafilático"),
            ]),
            overrides: vec![Override::new(
                "Hipotensão após exposição a alérgeno",
                all(vec![is(EXPOSURE), shock.clone()]),
            )],
            strategy: Strategy::CriteriaSets {
                prerequisites: vec![Finding::new(
                    "Exposição a alérgeno provável ou conhecido",
                    is(EXPOSURE),
                )],
                sets: vec![
                    CriterionSet::new(
                        "cutaneo_mucoso",
                        "Pele e mucosas",
                        vec![
                            Finding::new("Urticária, prurido ou rubor", is(URTICARIA)),
                            Finding::new("Angioedema", is(ANGIOEDEMA)),
                        ],
                    ),
                    CriterionSet::new(
                        "respiratorio",
                        "Respiratório",
                        vec![
                            Finding::new("Dispneia", is(DYSPNEA)),
                            Finding::new("Broncoespasmo", is(BRONCHOSPASM)),
                            Finding::new("Estridor", is(STRIDOR)),
                            Finding::new("SpO₂ < 92%", below(SPO2, 92.0)),
                        ],
                    ),
                    CriterionSet::new(
                        "cardiovascular",
                        "Cardiovascular",
                        vec![
                            Finding::new("Hipotensão", shock),
                            Finding::new("Síncope ou hipotonia", is(SYNCOPE)),
                        ],
                    ),
                    CriterionSet::new(
                        "gastrointestinal",
                        "Gastrointestinal",
                        vec![
                            Finding::new("Vômitos persistentes", is(VOMITING)),
                            Finding::new("Dor abdominal em cólica", is(ABDOMINAL_PAIN)),
                        ],
                    ),
                ],
                minimum: 2,
                met: "anafilaxia".to_string(),
                not_met: "sem_criterios".to_string(),
                escalations: vec![
                    LevelRule::new(
                        "Comprometimento de via aérea ou hipoxemia",
                        any(vec![is(STRIDOR), below(SPO2, 92.0)]),
                        "anafilaxia_grave",
                    ),
                    LevelRule::new(
                        "Alteração do nível de consciência",
                        is(ALTERED_CONSCIOUSNESS),
                        "anafilaxia_grave",
                    ),
                    LevelRule::new(
                        "Síncope ou hipotonia",
                        is(SYNCOPE),
                        "choque_anafilatico",
                    ),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                ADRENALINE,
                DoseFormula::per_kg(0.01).capped(0.3),
                DoseUnit::Mg,
                "IM, face anterolateral da coxa",
            )
            .frequency("repetir a cada 5 a 15 minutos se necessário")
            .concentration(1.0, 1.0)
            .rounding(Rounding::Decimals { places: 2 })
            .volume_rounding(Rounding::Decimals { places: 2 })
            .when(level_at_least("anafilaxia"))
            .note("Adrenalina 1 mg/mL (1:1000), sem diluição"),
            common::saline_bolus("Soro fisiológico 0,9%", 20.0)
                .frequency("em bolus; repetir conforme resposta")
                .when(any(vec![level_is("choque_anafilatico"), system("cardiovascular")])),
            MedicationRule::new(
                "Salbutamol spray (100 mcg/jato)",
                DoseFormula::per_kg(0.5).capped(10.0).floored(4.0),
                DoseUnit::Puffs,
                "inalatório com espaçador",
            )
            .frequency("a cada 20 minutos se broncoespasmo persistente")
            .rounding(Rounding::CeilTo { step: 1.0 })
            .when(all(vec![level_at_least("anafilaxia"), is(BRONCHOSPASM)])),
            MedicationRule::new(
                "Difenidramina",
                DoseFormula::per_kg(1.0).capped(50.0),
                DoseUnit::Mg,
                "IV ou IM",
            )
            .frequency("a cada 6 horas")
            .concentration(50.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(at_least(AGE_MONTHS, 24.0))
            .note("Adjuvante para sintomas cutâneos; não substitui a adrenalina"),
            MedicationRule::new(
                "Metilprednisolona",
                DoseFormula::per_kg(2.0).capped(125.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("dose única; manter a cada 6 horas se internado")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_at_least("anafilaxia")),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Avaliar via aérea, respiração e circulação",
                "Identificar e remover o agente desencadeante, se possível",
                "Monitorizar sinais vitais e SpO₂",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "sem_criterios",
                    &[
                        "Anti-histamínico oral para sintomas cutâneos isolados",
                        "Observar por pelo menos 4 horas quanto à progressão dos sintomas",
                        "Orientar sinais de alarme e retorno imediato",
                    ],
                ),
                LevelBlock::new(
                    "anafilaxia",
                    &[
                        "Adrenalina IM imediatamente, sem aguardar outros tratamentos",
                        "Decúbito dorsal com membros inferiores elevados (sentado se dispneia)",
                        "Oxigênio suplementar e acesso venoso calibroso",
                        "Observação mínima de 12 horas pelo risco de reação bifásica",
                    ],
                ),
                LevelBlock::new(
                    "anafilaxia_grave",
                    &[
                        "Adrenalina IM imediatamente; repetir se não houver melhora em 5 minutos",
                        "Oxigênio a 100% e preparo para via aérea avançada",
                        "Estridor: considerar adrenalina nebulizada como adjuvante",
                        "Acionar equipe de emergência",
                    ],
                ),
                LevelBlock::new(
                    "choque_anafilatico",
                    &[
                        "Adrenalina IM imediatamente e expansão volêmica com cristaloide",
                        "Refratário a 2 ou 3 doses IM: adrenalina em infusão contínua (0,1 a 1 mcg/kg/min)",
                        "Dois acessos venosos ou intraósseo",
                        "Acionar UTI pediátrica",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(ASTHMA),
                    &["Paciente asmático: maior risco de reação grave e de broncoespasmo persistente"],
                ),
                ConditionalBlock::new(
                    all(vec![level_at_least("anafilaxia"), is(BRONCHOSPASM)]),
                    &["Broncoespasmo persistente após adrenalina: associar salbutamol inalatório"],
                ),
                ConditionalBlock::new(
                    below(AGE_MONTHS, 24.0),
                    &["Menor de 2 anos: anti-histamínicos sedativos contraindicados"],
                ),
                ConditionalBlock::new(
                    level_at_least("anafilaxia"),
                    &[
                        "Prescrever adrenalina autoinjetável na alta",
                        "Encaminhar ao alergista",
                    ],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Anafilaxia grave ou choque", level_at_least("anafilaxia_grave")),
            Reason::new(
                "Anafilaxia em paciente asmático",
                all(vec![level_at_least("anafilaxia"), is(ASTHMA)]),
            ),
            Reason::new(
                "Antecedente de anafilaxia",
                all(vec![level_at_least("anafilaxia"), is(PREVIOUS_ANAPHYLAXIS)]),
            ),
        ],
        icu: Some(vec![
            Reason::new("Choque anafilático", level_is("choque_anafilatico")),
            Reason::new(
                "Alteração do nível de consciência",
                all(vec![level_at_least("anafilaxia"), is(ALTERED_CONSCIOUSNESS)]),
            ),
        ]),
        discharge_criteria: texts(&[
            "Ausência de sintomas ao fim do período de observação",
            "Prescrição de adrenalina autoinjetável e treinamento do uso",
            "Plano de ação por escrito",
            "Encaminhamento ao alergista",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::calculate_with;

    #[test]
    fn skin_alone_is_not_anaphylaxis() {
        let outcome = calculate_with(
            &definition(),
            &json!({ "weight": 20, "age": 6, "allergenExposure": true, "urticaria": true }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("sem_criterios"));
        assert!(result.dose(ADRENALINE).is_none());
    }

    #[test]
    fn stridor_escalates_to_severe() {
        let outcome = calculate_with(
            &definition(),
            &json!({
                "weight": 20, "age": 6, "allergenExposure": true,
                "urticaria": true, "stridor": true
            }),
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(result.classification.is_level("anafilaxia_grave"));
        assert!(result.hospitalization.indicated);
    }

    #[test]
    fn antihistamine_only_from_two_years() {
        let infant = json!({
            "weight": 9, "age": 12, "ageUnit": "meses", "allergenExposure": true,
            "urticaria": true, "persistentVomiting": true
        });
        let result = calculate_with(&definition(), &infant).unwrap();
        assert!(result.result().unwrap().dose("Difenidramina").is_none());

        let child = json!({
            "weight": 14, "age": 3, "allergenExposure": true,
            "urticaria": true, "persistentVomiting": true
        });
        let result = calculate_with(&definition(), &child).unwrap();
        assert!(result.result().unwrap().dose("Difenidramina").is_some());
    }
}
