//! Recommendation composer.

use serde::{Deserialize, Serialize};

use pedi_core::models::classification::ClassificationResult;
use pedi_core::models::dose::DoseResult;
use pedi_core::models::params::PatientParameters;
use pedi_core::models::result::Indication;

use crate::definition::{ProtocolDefinition, Reason};
use crate::error::ConfigurationError;
use crate::predicate::EvalContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub recommendations: Vec<String>,
    pub hospitalization: Indication,
    pub icu_indication: Option<Indication>,
    pub discharge_criteria: Vec<String>,
}

/// Assemble recommendations in a fixed order: general measures, the block
/// for the classified level, conditional blocks in declaration order, then
/// one note per capped dose.
pub fn compose(
    protocol: &ProtocolDefinition,
    params: &PatientParameters,
    classification: &ClassificationResult,
    doses: &[DoseResult],
) -> Result<RecommendationBundle, ConfigurationError> {
    let ctx =
        EvalContext::with_classification(params, classification, &protocol.classification.levels);
    let rules = &protocol.recommendations;

    let level_block = rules
        .by_level
        .iter()
        .find(|b| b.level == classification.level.id)
        .ok_or_else(|| ConfigurationError::MissingLevelBlock {
            protocol: protocol.id.clone(),
            level: classification.level.id.clone(),
        })?;

    let mut recommendations = rules.general.clone();
    recommendations.extend(level_block.items.iter().cloned());
    for block in &rules.conditional {
        if block.when.evaluate(&ctx) {
            recommendations.extend(block.items.iter().cloned());
        }
    }
    for dose in doses.iter().filter(|d| d.capped) {
        recommendations.push(format!(
            "{}: dose máxima atingida ({} {}).",
            dose.medication, dose.amount, dose.unit
        ));
    }

    let hospitalization = indication(&protocol.hospitalization, &ctx);
    let icu_indication = protocol.icu.as_ref().map(|reasons| indication(reasons, &ctx));
    let discharge_criteria = if hospitalization.indicated {
        Vec::new()
    } else {
        protocol.discharge_criteria.clone()
    };

    Ok(RecommendationBundle {
        recommendations,
        hospitalization,
        icu_indication,
        discharge_criteria,
    })
}

fn indication(reasons: &[Reason], ctx: &EvalContext<'_>) -> Indication {
    Indication::from_reasons(
        reasons
            .iter()
            .filter(|r| r.when.evaluate(ctx))
            .map(|r| r.description.clone())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use pedi_core::models::classification::LevelOutcome;
    use pedi_core::models::params::FieldValue;
    use pedi_core::units::DoseUnit;

    use super::*;
    use crate::definition::{
        ClassificationRules, ConditionalBlock, LevelBlock, LevelRule, RecommendationRules,
        Strategy, levels, texts,
    };
    use crate::predicate::{is, level_is};

    fn protocol() -> ProtocolDefinition {
        ProtocolDefinition {
            id: "teste".to_string(),
            name: "Teste".to_string(),
            description: String::new(),
            fields: vec![],
            classification: ClassificationRules {
                levels: levels(&[("leve", "Leve"), ("grave", "Grave")]),
                overrides: vec![],
                strategy: Strategy::Direct {
                    rules: vec![LevelRule::otherwise("sempre", "leve")],
                },
            },
            medications: vec![],
            recommendations: RecommendationRules {
                general: texts(&["Monitorizar", "Acesso venoso"]),
                by_level: vec![
                    LevelBlock::new("leve", &["Tratamento ambulatorial"]),
                    LevelBlock::new("grave", &["Sala de emergência"]),
                ],
                conditional: vec![
                    ConditionalBlock::new(is("prematuro"), &["Atenção à prematuridade"]),
                    ConditionalBlock::new(is("cardiopatia"), &["Avaliar cardiopatia"]),
                ],
            },
            hospitalization: vec![
                Reason::new("Classificação grave", level_is("grave")),
                Reason::new("Cardiopatia", is("cardiopatia")),
            ],
            icu: Some(vec![Reason::new("Grave", level_is("grave"))]),
            discharge_criteria: texts(&["Boa aceitação oral"]),
        }
    }

    fn classification(id: &str, rank: u32) -> ClassificationResult {
        ClassificationResult {
            level: LevelOutcome {
                id: id.to_string(),
                label: id.to_string(),
                rank,
            },
            score: None,
            contributing_criteria: vec![],
            systems_involved: BTreeSet::new(),
            overridden: false,
        }
    }

    fn params(flags: &[&str]) -> PatientParameters {
        let values = flags
            .iter()
            .map(|f| (f.to_string(), FieldValue::Bool(true)))
            .collect::<BTreeMap<_, _>>();
        PatientParameters::new(10.0, 24.0, values)
    }

    #[test]
    fn blocks_follow_declared_order_not_flag_order() {
        let bundle = compose(
            &protocol(),
            &params(&["cardiopatia", "prematuro"]),
            &classification("leve", 0),
            &[],
        )
        .unwrap();
        assert_eq!(
            bundle.recommendations,
            vec![
                "Monitorizar",
                "Acesso venoso",
                "Tratamento ambulatorial",
                "Atenção à prematuridade",
                "Avaliar cardiopatia",
            ]
        );
    }

    #[test]
    fn every_hospitalization_reason_is_listed_and_discharge_is_suppressed() {
        let bundle = compose(
            &protocol(),
            &params(&["cardiopatia"]),
            &classification("grave", 1),
            &[],
        )
        .unwrap();
        assert!(bundle.hospitalization.indicated);
        assert_eq!(bundle.hospitalization.reasons, vec!["Classificação grave", "Cardiopatia"]);
        assert!(bundle.icu_indication.unwrap().indicated);
        assert!(bundle.discharge_criteria.is_empty());
    }

    #[test]
    fn discharge_criteria_only_without_hospitalization() {
        let bundle = compose(&protocol(), &params(&[]), &classification("leve", 0), &[]).unwrap();
        assert!(!bundle.hospitalization.indicated);
        assert_eq!(bundle.discharge_criteria, vec!["Boa aceitação oral"]);
    }

    #[test]
    fn capped_doses_add_a_note() {
        let dose = DoseResult {
            medication: "Adrenalina IM".to_string(),
            amount: 0.3,
            unit: DoseUnit::Mg,
            capped: true,
            route: "IM".to_string(),
            frequency: None,
            volume: None,
            note: None,
        };
        let bundle =
            compose(&protocol(), &params(&[]), &classification("leve", 0), &[dose]).unwrap();
        assert_eq!(
            bundle.recommendations.last().map(String::as_str),
            Some("Adrenalina IM: dose máxima atingida (0.3 mg).")
        );
    }
}
