//! Convulsive status epilepticus: staged by seizure duration and by the
//! response to first- and second-line drugs.

use pedi_core::models::params::{AGE_MONTHS, FieldValue};
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, GLUCOSE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{all, any, at_least, below, is, level_at_least, level_is, not};

pub const DURATION: &str = "seizureDurationMinutes";
const ONGOING: &str = "ongoingSeizure";
const BENZODIAZEPINE_DOSES: &str = "benzodiazepineDoses";
const SECOND_LINE_GIVEN: &str = "secondLineGiven";
const VENOUS_ACCESS: &str = "venousAccess";
const FEVER: &str = "fever";
const HEAD_TRAUMA: &str = "headTrauma";
const KNOWN_EPILEPSY: &str = "knownEpilepsy";

pub fn definition() -> ProtocolDefinition {
    let first_line = all(vec![is(ONGOING), below(BENZODIAZEPINE_DOSES, 2.0)]);
    let second_line = all(vec![
        is(ONGOING),
        not(is(SECOND_LINE_GIVEN)),
        any(vec![
            at_least(BENZODIAZEPINE_DOSES, 2.0),
            level_at_least("estabelecido"),
        ]),
    ]);

    ProtocolDefinition {
        id: "estado_de_mal_epileptico".to_string(),
        name: "Estado de mal epiléptico".to_string(),
        description: "Sequência de tratamento da crise convulsiva prolongada por tempo de \
                      crise e resposta às drogas."
            .to_string(),
        fields: common::patient_fields(vec![
            FieldSpec::number(DURATION, "Duração da crise (minutos)").between(0.0, 600.0),
            FieldSpec::flag(ONGOING, "Crise em curso").required(),
            FieldSpec::integer(BENZODIAZEPINE_DOSES, "Doses de benzodiazepínico já administradas")
                .between(0.0, 5.0)
                .defaults_to(FieldValue::Number(0.0)),
            FieldSpec::flag(SECOND_LINE_GIVEN, "Droga de segunda linha já administrada"),
            FieldSpec::flag(VENOUS_ACCESS, "Acesso venoso disponível"),
            common::glucose().unassessed(),
            FieldSpec::flag(FEVER, "Febre"),
            FieldSpec::flag(HEAD_TRAUMA, "Trauma craniano recente"),
            FieldSpec::flag(KNOWN_EPILEPSY, "Epilepsia conhecida"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("crise", "Crise epiléptica (< 5 minutos)"),
                ("inicial", "Estado de mal epiléptico inicial (≥ 5 minutos)"),
                ("estabelecido", "Estado de mal epiléptico estabelecido (≥ 30 minutos)"),
                ("refratario", "Estado de mal epiléptico refratário"),
            ]),
            overrides: vec![],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Crise persistente após benzodiazepínico e droga de segunda linha",
                        all(vec![is(ONGOING), is(SECOND_LINE_GIVEN)]),
                        "refratario",
                    ),
                    LevelRule::new("Duração ≥ 30 minutos", at_least(DURATION, 30.0), "estabelecido"),
                    LevelRule::new("Duração ≥ 5 minutos", at_least(DURATION, 5.0), "inicial"),
                    LevelRule::otherwise("Duração < 5 minutos", "crise"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                "Diazepam IV",
                DoseFormula::per_kg(0.3).capped(10.0),
                DoseUnit::Mg,
                "IV lento",
            )
            .frequency("pode repetir uma vez após 5 minutos")
            .concentration(5.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(all(vec![first_line.clone(), is(VENOUS_ACCESS)])),
            MedicationRule::new(
                "Midazolam IM ou intranasal",
                DoseFormula::per_kg(0.2).capped(10.0),
                DoseUnit::Mg,
                "IM ou intranasal",
            )
            .frequency("pode repetir uma vez após 5 minutos")
            .concentration(5.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(all(vec![first_line, not(is(VENOUS_ACCESS))])),
            MedicationRule::new(
                "Fenitoína",
                DoseFormula::per_kg(20.0).capped(1500.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("dose de ataque")
            .concentration(50.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![second_line.clone(), at_least(AGE_MONTHS, 1.0)]))
            .note("Diluir em SF 0,9%; infundir a no máximo 1 mg/kg/min (máximo 50 mg/min)"),
            MedicationRule::new(
                "Levetiracetam",
                DoseFormula::per_kg(60.0).capped(4500.0),
                DoseUnit::Mg,
                "IV em 10 minutos",
            )
            .frequency("dose de ataque")
            .concentration(100.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(second_line.clone())
            .note("Alternativa à fenitoína"),
            MedicationRule::new(
                "Fenobarbital",
                DoseFormula::per_kg(20.0).capped(1000.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("dose de ataque")
            .concentration(100.0, 1.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(any(vec![
                level_is("refratario"),
                all(vec![second_line, below(AGE_MONTHS, 1.0)]),
            ]))
            .note("Primeira escolha de segunda linha no período neonatal"),
            MedicationRule::new(
                "Midazolam (ataque para infusão contínua)",
                DoseFormula::per_kg(0.2).capped(10.0),
                DoseUnit::Mg,
                "IV",
            )
            .concentration(5.0, 1.0)
            .rounding(Rounding::Decimals { places: 1 })
            .when(level_is("refratario"))
            .note("Seguir com infusão de 0,05 a 2 mg/kg/h titulada pelo EEG"),
            common::dextrose_bolus().when(below(GLUCOSE, 60.0)),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Posicionar em decúbito lateral e proteger contra traumas",
                "Oxigênio, aspiração de vias aéreas e monitorização",
                "Glicemia capilar imediata",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "crise",
                    &[
                        "Observar: a maioria das crises cessa espontaneamente em até 5 minutos",
                        "Preparar benzodiazepínico se a crise persistir",
                    ],
                ),
                LevelBlock::new(
                    "inicial",
                    &[
                        "Benzodiazepínico imediatamente; repetir uma vez após 5 minutos",
                        "Obter acesso venoso sem atrasar a primeira dose",
                    ],
                ),
                LevelBlock::new(
                    "estabelecido",
                    &[
                        "Droga de segunda linha: fenitoína ou levetiracetam",
                        "Colher eletrólitos, cálcio, magnésio e nível sérico de anticonvulsivantes",
                    ],
                ),
                LevelBlock::new(
                    "refratario",
                    &[
                        "Intubação e infusão contínua de midazolam",
                        "Monitorização por EEG contínuo",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    all(vec![is(FEVER), below(AGE_MONTHS, 12.0)]),
                    &["Febre em lactente: investigar meningite"],
                ),
                ConditionalBlock::new(
                    is(HEAD_TRAUMA),
                    &["Trauma craniano: tomografia de crânio após estabilização"],
                ),
                ConditionalBlock::new(
                    is(KNOWN_EPILEPSY),
                    &["Epilepsia conhecida: verificar adesão e nível sérico das medicações"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Estado de mal epiléptico", level_at_least("inicial")),
            Reason::new("Trauma craniano associado", is(HEAD_TRAUMA)),
            Reason::new(
                "Primeira crise febril em lactente",
                all(vec![is(FEVER), below(AGE_MONTHS, 12.0)]),
            ),
        ],
        icu: Some(vec![
            Reason::new("Estado de mal estabelecido ou refratário", level_at_least("estabelecido")),
        ]),
        discharge_criteria: texts(&[
            "Retorno ao estado neurológico basal",
            "Causa identificada e tratada",
            "Orientação sobre conduta em nova crise",
            "Seguimento com neuropediatra",
        ]),
    }
}
