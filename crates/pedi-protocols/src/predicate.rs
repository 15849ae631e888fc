//! Closed predicate language over patient parameters.
//!
//! The same predicates drive classification criteria, medication
//! applicability, conditional recommendations and hospitalization reasons.
//! Every comparison side is an explicit variant: `Below` is strict, `AtMost`
//! is inclusive, and so on.

use serde::{Deserialize, Serialize};

use pedi_core::models::classification::ClassificationResult;
use pedi_core::models::params::PatientParameters;

use crate::definition::LevelSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    IsTrue { field: String },
    Equals { field: String, value: String },
    OneOf { field: String, values: Vec<String> },
    /// `field < value`
    Below { field: String, value: f64 },
    /// `field <= value`
    AtMost { field: String, value: f64 },
    /// `field >= value`
    AtLeast { field: String, value: f64 },
    /// `field > value`
    Above { field: String, value: f64 },
    /// The field was declared `Unassessed` and left out of the input.
    Unassessed { field: String },
    /// Systolic pressure in `field` below the age-adjusted lower limit.
    HypotensiveForAge { field: String },
    LevelIs { level: String },
    LevelAtLeast { level: String },
    SystemInvolved { tag: String },
    All { of: Vec<Predicate> },
    Any { of: Vec<Predicate> },
    Not { predicate: Box<Predicate> },
    CountAtLeast { n: usize, of: Vec<Predicate> },
}

/// What a predicate can see. Classification runs without a level; every
/// later stage has one.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub params: &'a PatientParameters,
    pub classification: Option<(&'a ClassificationResult, &'a [LevelSpec])>,
}

impl<'a> EvalContext<'a> {
    pub fn new(params: &'a PatientParameters) -> Self {
        Self {
            params,
            classification: None,
        }
    }

    pub fn with_classification(
        params: &'a PatientParameters,
        classification: &'a ClassificationResult,
        levels: &'a [LevelSpec],
    ) -> Self {
        Self {
            params,
            classification: Some((classification, levels)),
        }
    }
}

/// Lower limit of normal systolic pressure (mmHg) for a child of the given
/// age: 60 for neonates, 70 up to one year, 70 + 2 x age in years up to ten,
/// 90 afterwards.
pub fn systolic_lower_limit(age_months: f64) -> f64 {
    if age_months < 1.0 {
        60.0
    } else if age_months < 12.0 {
        70.0
    } else if age_months < 120.0 {
        70.0 + 2.0 * (age_months / 12.0).floor()
    } else {
        90.0
    }
}

impl Predicate {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        let params = ctx.params;
        match self {
            Predicate::Always => true,
            Predicate::IsTrue { field } => params.flag(field) == Some(true),
            Predicate::Equals { field, value } => params.text(field) == Some(value.as_str()),
            Predicate::OneOf { field, values } => params
                .text(field)
                .is_some_and(|text| values.iter().any(|v| v == text)),
            Predicate::Below { field, value } => params.number(field).is_some_and(|n| n < *value),
            Predicate::AtMost { field, value } => params.number(field).is_some_and(|n| n <= *value),
            Predicate::AtLeast { field, value } => {
                params.number(field).is_some_and(|n| n >= *value)
            }
            Predicate::Above { field, value } => params.number(field).is_some_and(|n| n > *value),
            Predicate::Unassessed { field } => params.get(field).is_none(),
            Predicate::HypotensiveForAge { field } => params
                .number(field)
                .is_some_and(|systolic| systolic < systolic_lower_limit(params.age_months)),
            Predicate::LevelIs { level } => ctx
                .classification
                .is_some_and(|(result, _)| result.level.id == *level),
            Predicate::LevelAtLeast { level } => {
                ctx.classification.is_some_and(|(result, levels)| {
                    levels
                        .iter()
                        .position(|l| l.id == *level)
                        .is_some_and(|rank| result.level.rank as usize >= rank)
                })
            }
            Predicate::SystemInvolved { tag } => ctx
                .classification
                .is_some_and(|(result, _)| result.systems_involved.contains(tag)),
            Predicate::All { of } => of.iter().all(|p| p.evaluate(ctx)),
            Predicate::Any { of } => of.iter().any(|p| p.evaluate(ctx)),
            Predicate::Not { predicate } => !predicate.evaluate(ctx),
            Predicate::CountAtLeast { n, of } => {
                of.iter().filter(|p| p.evaluate(ctx)).count() >= *n
            }
        }
    }

    /// True if this predicate, or any nested one, needs a classification.
    pub fn depends_on_classification(&self) -> bool {
        match self {
            Predicate::LevelIs { .. }
            | Predicate::LevelAtLeast { .. }
            | Predicate::SystemInvolved { .. } => true,
            Predicate::All { of } | Predicate::Any { of } | Predicate::CountAtLeast { of, .. } => {
                of.iter().any(Predicate::depends_on_classification)
            }
            Predicate::Not { predicate } => predicate.depends_on_classification(),
            _ => false,
        }
    }

    /// Visit this predicate and all nested ones, depth first.
    pub fn walk<'p>(&'p self, visit: &mut impl FnMut(&'p Predicate)) {
        visit(self);
        match self {
            Predicate::All { of } | Predicate::Any { of } | Predicate::CountAtLeast { of, .. } => {
                for p in of {
                    p.walk(visit);
                }
            }
            Predicate::Not { predicate } => predicate.walk(visit),
            _ => {}
        }
    }
}

// Constructors used by the protocol definitions.

pub fn always() -> Predicate {
    Predicate::Always
}

pub fn is(field: &str) -> Predicate {
    Predicate::IsTrue {
        field: field.to_string(),
    }
}

pub fn eq(field: &str, value: &str) -> Predicate {
    Predicate::Equals {
        field: field.to_string(),
        value: value.to_string(),
    }
}

pub fn one_of(field: &str, values: &[&str]) -> Predicate {
    Predicate::OneOf {
        field: field.to_string(),
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

pub fn below(field: &str, value: f64) -> Predicate {
    Predicate::Below {
        field: field.to_string(),
        value,
    }
}

pub fn at_most(field: &str, value: f64) -> Predicate {
    Predicate::AtMost {
        field: field.to_string(),
        value,
    }
}

pub fn at_least(field: &str, value: f64) -> Predicate {
    Predicate::AtLeast {
        field: field.to_string(),
        value,
    }
}

pub fn above(field: &str, value: f64) -> Predicate {
    Predicate::Above {
        field: field.to_string(),
        value,
    }
}

pub fn hypotensive(field: &str) -> Predicate {
    Predicate::HypotensiveForAge {
        field: field.to_string(),
    }
}

pub fn unassessed(field: &str) -> Predicate {
    Predicate::Unassessed {
        field: field.to_string(),
    }
}

pub fn level_is(level: &str) -> Predicate {
    Predicate::LevelIs {
        level: level.to_string(),
    }
}

pub fn level_at_least(level: &str) -> Predicate {
    Predicate::LevelAtLeast {
        level: level.to_string(),
    }
}

pub fn system(tag: &str) -> Predicate {
    Predicate::SystemInvolved {
        tag: tag.to_string(),
    }
}

pub fn all(of: Vec<Predicate>) -> Predicate {
    Predicate::All { of }
}

pub fn any(of: Vec<Predicate>) -> Predicate {
    Predicate::Any { of }
}

pub fn not(predicate: Predicate) -> Predicate {
    Predicate::Not {
        predicate: Box::new(predicate),
    }
}

pub fn count_at_least(n: usize, of: Vec<Predicate>) -> Predicate {
    Predicate::CountAtLeast { n, of }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use pedi_core::models::classification::LevelOutcome;
    use pedi_core::models::params::FieldValue;

    use super::*;

    fn params(values: &[(&str, FieldValue)]) -> PatientParameters {
        let values: BTreeMap<String, FieldValue> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        PatientParameters::new(20.0, 72.0, values)
    }

    #[test]
    fn strict_and_inclusive_sides_differ_at_the_boundary() {
        let p = params(&[("saturacao", FieldValue::Number(90.0))]);
        let ctx = EvalContext::new(&p);
        assert!(!below("saturacao", 90.0).evaluate(&ctx));
        assert!(at_most("saturacao", 90.0).evaluate(&ctx));
        assert!(at_least("saturacao", 90.0).evaluate(&ctx));
        assert!(!above("saturacao", 90.0).evaluate(&ctx));
    }

    #[test]
    fn absent_fields_never_match() {
        let p = params(&[]);
        let ctx = EvalContext::new(&p);
        assert!(!is("febre").evaluate(&ctx));
        assert!(!below("saturacao", 92.0).evaluate(&ctx));
        assert!(!eq("sibilancia", "silencio").evaluate(&ctx));
        assert!(not(is("febre")).evaluate(&ctx));
        assert!(unassessed("saturacao").evaluate(&ctx));
    }

    #[test]
    fn derived_age_fields_are_addressable() {
        let p = params(&[]);
        let ctx = EvalContext::new(&p);
        assert!(at_least("ageYears", 6.0).evaluate(&ctx));
        assert!(below("ageMonths", 73.0).evaluate(&ctx));
    }

    #[test]
    fn count_at_least_counts_matches() {
        let p = params(&[
            ("a", FieldValue::Bool(true)),
            ("b", FieldValue::Bool(false)),
            ("c", FieldValue::Bool(true)),
        ]);
        let ctx = EvalContext::new(&p);
        assert!(count_at_least(2, vec![is("a"), is("b"), is("c")]).evaluate(&ctx));
        assert!(!count_at_least(3, vec![is("a"), is("b"), is("c")]).evaluate(&ctx));
    }

    #[test]
    fn systolic_limit_follows_age() {
        assert_eq!(systolic_lower_limit(0.5), 60.0);
        assert_eq!(systolic_lower_limit(6.0), 70.0);
        assert_eq!(systolic_lower_limit(60.0), 80.0);
        assert_eq!(systolic_lower_limit(144.0), 90.0);

        let p = params(&[("pas", FieldValue::Number(79.0))]);
        assert!(hypotensive("pas").evaluate(&EvalContext::new(&p)));
    }

    #[test]
    fn level_predicates_need_a_classification() {
        let levels = vec![
            LevelSpec::new("leve", "Leve"),
            LevelSpec::new("moderada", "Moderada"),
            LevelSpec::new("grave", "Grave"),
        ];
        let classification = ClassificationResult {
            level: LevelOutcome {
                id: "moderada".to_string(),
                label: "Moderada".to_string(),
                rank: 1,
            },
            score: Some(4.0),
            contributing_criteria: vec![],
            systems_involved: BTreeSet::from(["respiratorio".to_string()]),
            overridden: false,
        };
        let p = params(&[]);

        assert!(!level_is("moderada").evaluate(&EvalContext::new(&p)));

        let ctx = EvalContext::with_classification(&p, &classification, &levels);
        assert!(level_is("moderada").evaluate(&ctx));
        assert!(level_at_least("leve").evaluate(&ctx));
        assert!(level_at_least("moderada").evaluate(&ctx));
        assert!(!level_at_least("grave").evaluate(&ctx));
        assert!(system("respiratorio").evaluate(&ctx));
        assert!(level_at_least("moderada").depends_on_classification());
        assert!(!is("febre").depends_on_classification());
    }
}
