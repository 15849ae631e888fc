//! Classification engine.
//!
//! Overrides run first and force the most severe declared level; the
//! protocol's strategy still runs so that score, contributing criteria and
//! systems involved are reported alongside the forced level.

use std::collections::BTreeSet;

use pedi_core::models::classification::{ClassificationResult, LevelOutcome};
use pedi_core::models::params::PatientParameters;

use crate::definition::{ProtocolDefinition, Strategy, Threshold};
use crate::error::ConfigurationError;
use crate::predicate::EvalContext;

struct StrategyOutcome {
    level: Option<String>,
    score: Option<f64>,
    criteria: Vec<String>,
    systems: BTreeSet<String>,
}

pub fn classify(
    protocol: &ProtocolDefinition,
    params: &PatientParameters,
) -> Result<ClassificationResult, ConfigurationError> {
    let rules = &protocol.classification;
    let ctx = EvalContext::new(params);

    let overrides: Vec<String> = rules
        .overrides
        .iter()
        .filter(|o| o.when.evaluate(&ctx))
        .map(|o| o.description.clone())
        .collect();

    let outcome = match &rules.strategy {
        Strategy::Scored {
            criteria,
            thresholds,
        } => {
            let matched: Vec<_> = criteria.iter().filter(|c| c.when.evaluate(&ctx)).collect();
            let score: f64 = matched.iter().map(|c| c.weight).sum();
            StrategyOutcome {
                level: threshold_level(thresholds, score),
                score: Some(score),
                criteria: matched.iter().map(|c| c.description.clone()).collect(),
                systems: BTreeSet::new(),
            }
        }
        Strategy::CriteriaSets {
            prerequisites,
            sets,
            minimum,
            met,
            not_met,
            escalations,
        } => {
            let mut criteria = Vec::new();
            let prerequisites_hold = prerequisites.iter().all(|p| {
                let holds = p.when.evaluate(&ctx);
                if holds {
                    criteria.push(p.description.clone());
                }
                holds
            });

            let mut systems = BTreeSet::new();
            for set in sets {
                let findings: Vec<_> = set
                    .findings
                    .iter()
                    .filter(|f| f.when.evaluate(&ctx))
                    .map(|f| format!("{}: {}", set.label, f.description))
                    .collect();
                if !findings.is_empty() {
                    systems.insert(set.tag.clone());
                    criteria.extend(findings);
                }
            }

            let level = if prerequisites_hold && systems.len() >= *minimum {
                let escalated = escalations
                    .iter()
                    .filter(|e| e.when.evaluate(&ctx))
                    .inspect(|e| criteria.push(e.description.clone()))
                    .filter_map(|e| rules.level_rank(&e.level).map(|rank| (rank, &e.level)))
                    .max_by_key(|(rank, _)| *rank)
                    .map(|(_, level)| level.clone());
                escalated.unwrap_or_else(|| met.clone())
            } else {
                not_met.clone()
            };

            StrategyOutcome {
                level: Some(level),
                score: None,
                criteria,
                systems,
            }
        }
        Strategy::Direct { rules: direct } => {
            let rule = direct.iter().find(|r| r.when.evaluate(&ctx));
            StrategyOutcome {
                level: rule.map(|r| r.level.clone()),
                score: None,
                criteria: rule.map(|r| vec![r.description.clone()]).unwrap_or_default(),
                systems: BTreeSet::new(),
            }
        }
    };

    let overridden = !overrides.is_empty();
    let level_id = if overridden {
        rules.most_severe().map(|l| l.id.clone())
    } else {
        outcome.level
    };

    let no_match = || ConfigurationError::NoMatchingClassification {
        protocol: protocol.id.clone(),
    };
    let level_id = level_id.ok_or_else(no_match)?;
    let rank = rules.level_rank(&level_id).ok_or_else(|| ConfigurationError::UnknownLevel {
        protocol: protocol.id.clone(),
        level: level_id.clone(),
    })?;
    let spec = &rules.levels[rank];

    let mut contributing_criteria = overrides;
    contributing_criteria.extend(outcome.criteria);

    tracing::debug!(
        protocol_id = %protocol.id,
        level = %spec.id,
        score = ?outcome.score,
        overridden,
        "classified"
    );

    Ok(ClassificationResult {
        level: LevelOutcome {
            id: spec.id.clone(),
            label: spec.label.clone(),
            rank: rank as u32,
        },
        score: outcome.score,
        contributing_criteria,
        systems_involved: outcome.systems,
        overridden,
    })
}

/// Highest satisfied threshold wins, regardless of declaration order.
fn threshold_level(thresholds: &[Threshold], score: f64) -> Option<String> {
    thresholds
        .iter()
        .filter(|t| score >= t.min_score)
        .max_by(|a, b| a.min_score.total_cmp(&b.min_score))
        .map(|t| t.level.clone())
}
