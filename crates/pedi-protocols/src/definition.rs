//! Protocol definitions as immutable data.
//!
//! A [`ProtocolDefinition`] wires the validator, classification engine,
//! dose calculator and recommendation composer together with the constants
//! and predicates of one clinical condition. Definitions are plain values:
//! they serialize, they can be loaded from a JSON catalog, and they are
//! checked for consistency before a registry accepts them.

use serde::{Deserialize, Serialize};

use pedi_core::models::params::FieldValue;
use pedi_core::units::{Concentration, DoseUnit, Rounding};

use crate::formula::DoseFormula;
use crate::predicate::{Predicate, always};

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// An inclusive or exclusive numeric bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }

    pub fn admits_above(&self, n: f64) -> bool {
        if self.inclusive {
            n >= self.value
        } else {
            n > self.value
        }
    }

    pub fn admits_below(&self, n: f64) -> bool {
        if self.inclusive {
            n <= self.value
        } else {
            n < self.value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Number {
        min: Option<Bound>,
        max: Option<Bound>,
        integer: bool,
    },
    Boolean,
    Choice {
        options: Vec<String>,
    },
}

/// What happens when a field is absent from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Presence {
    Required,
    /// Absent means this documented value.
    Default(FieldValue),
    /// Absent means "not assessed": the field stays missing and every
    /// predicate over it is false.
    Unassessed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub presence: Presence,
}

impl FieldSpec {
    /// A required numeric field with no bounds yet.
    pub fn number(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Number {
                min: None,
                max: None,
                integer: false,
            },
            presence: Presence::Required,
        }
    }

    pub fn integer(name: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Number {
                min: None,
                max: None,
                integer: true,
            },
            ..Self::number(name, label)
        }
    }

    /// A boolean finding. Absent means "assessed as negative".
    pub fn flag(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Boolean,
            presence: Presence::Default(FieldValue::Bool(false)),
        }
    }

    pub fn choice(name: &str, label: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Choice {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
            presence: Presence::Required,
        }
    }

    /// Inclusive range `[min, max]`.
    pub fn between(self, min: f64, max: f64) -> Self {
        self.bounded(Some(Bound::inclusive(min)), Some(Bound::inclusive(max)))
    }

    /// `min < value <= max`.
    pub fn above_up_to(self, min: f64, max: f64) -> Self {
        self.bounded(Some(Bound::exclusive(min)), Some(Bound::inclusive(max)))
    }

    pub fn at_least(self, min: f64) -> Self {
        self.bounded(Some(Bound::inclusive(min)), None)
    }

    fn bounded(mut self, new_min: Option<Bound>, new_max: Option<Bound>) -> Self {
        if let FieldKind::Number { min, max, .. } = &mut self.kind {
            *min = new_min;
            *max = new_max;
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn unassessed(mut self) -> Self {
        self.presence = Presence::Unassessed;
        self
    }

    pub fn defaults_to(mut self, value: FieldValue) -> Self {
        self.presence = Presence::Default(value);
        self
    }

    pub fn defaults_to_option(self, option: &str) -> Self {
        self.defaults_to(FieldValue::Text(option.to_string()))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Number { .. })
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub id: String,
    pub label: String,
}

impl LevelSpec {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

/// Build an ordered level list, least severe first.
pub fn levels(pairs: &[(&str, &str)]) -> Vec<LevelSpec> {
    pairs.iter().map(|(id, label)| LevelSpec::new(id, label)).collect()
}

/// A danger sign that forces the most severe level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub description: String,
    pub when: Predicate,
}

impl Override {
    pub fn new(description: &str, when: Predicate) -> Self {
        Self {
            description: description.to_string(),
            when,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub description: String,
    pub when: Predicate,
    pub weight: f64,
}

impl Criterion {
    pub fn new(description: &str, when: Predicate, weight: f64) -> Self {
        Self {
            description: description.to_string(),
            when,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub min_score: f64,
    pub level: String,
}

impl Threshold {
    pub fn new(min_score: f64, level: &str) -> Self {
        Self {
            min_score,
            level: level.to_string(),
        }
    }
}

/// A single finding inside a criterion set, or a prerequisite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub description: String,
    pub when: Predicate,
}

impl Finding {
    pub fn new(description: &str, when: Predicate) -> Self {
        Self {
            description: description.to_string(),
            when,
        }
    }
}

/// A body system or diagnostic criterion; it matches when any finding does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSet {
    pub tag: String,
    pub label: String,
    pub findings: Vec<Finding>,
}

impl CriterionSet {
    pub fn new(tag: &str, label: &str, findings: Vec<Finding>) -> Self {
        Self {
            tag: tag.to_string(),
            label: label.to_string(),
            findings,
        }
    }
}

/// A rule mapping a predicate to a level: direct rules and escalations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRule {
    pub description: String,
    pub when: Predicate,
    pub level: String,
}

impl LevelRule {
    pub fn new(description: &str, when: Predicate, level: &str) -> Self {
        Self {
            description: description.to_string(),
            when,
            level: level.to_string(),
        }
    }

    /// Catch-all rule closing a direct rule list.
    pub fn otherwise(description: &str, level: &str) -> Self {
        Self::new(description, always(), level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Sum the weights of matched criteria, then take the highest satisfied
    /// `(min_score, level)` threshold.
    Scored {
        criteria: Vec<Criterion>,
        thresholds: Vec<Threshold>,
    },
    /// Count distinct matched sets; `met` when all prerequisites hold and at
    /// least `minimum` sets match, otherwise `not_met`. Escalations apply
    /// only to a met classification; the most severe matching one wins.
    CriteriaSets {
        prerequisites: Vec<Finding>,
        sets: Vec<CriterionSet>,
        minimum: usize,
        met: String,
        not_met: String,
        escalations: Vec<LevelRule>,
    },
    /// First matching rule wins; the last rule must be a catch-all.
    Direct { rules: Vec<LevelRule> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRules {
    /// Ordered least severe first.
    pub levels: Vec<LevelSpec>,
    /// Evaluated before the strategy, in declaration order.
    pub overrides: Vec<Override>,
    pub strategy: Strategy,
}

impl ClassificationRules {
    pub fn level_rank(&self, id: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.id == id)
    }

    pub fn most_severe(&self) -> Option<&LevelSpec> {
        self.levels.last()
    }
}

// ---------------------------------------------------------------------------
// Medications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRule {
    pub name: String,
    pub formula: DoseFormula,
    pub unit: DoseUnit,
    pub route: String,
    pub frequency: Option<String>,
    pub concentration: Option<Concentration>,
    pub rounding: Rounding,
    pub volume_rounding: Rounding,
    pub applies_when: Predicate,
    pub note: Option<String>,
}

impl MedicationRule {
    pub fn new(name: &str, formula: DoseFormula, unit: DoseUnit, route: &str) -> Self {
        Self {
            name: name.to_string(),
            formula,
            unit,
            route: route.to_string(),
            frequency: None,
            concentration: None,
            rounding: Rounding::default(),
            volume_rounding: Rounding::one_decimal(),
            applies_when: always(),
            note: None,
        }
    }

    pub fn frequency(mut self, frequency: &str) -> Self {
        self.frequency = Some(frequency.to_string());
        self
    }

    /// Present as `mg` of active substance in `ml` of solution.
    pub fn concentration(mut self, mg: f64, ml: f64) -> Self {
        self.concentration = Some(Concentration::new(mg, ml));
        self
    }

    pub fn rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn volume_rounding(mut self, rounding: Rounding) -> Self {
        self.volume_rounding = rounding;
        self
    }

    pub fn when(mut self, predicate: Predicate) -> Self {
        self.applies_when = predicate;
        self
    }

    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBlock {
    pub level: String,
    pub items: Vec<String>,
}

impl LevelBlock {
    pub fn new(level: &str, items: &[&str]) -> Self {
        Self {
            level: level.to_string(),
            items: texts(items),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    pub when: Predicate,
    pub items: Vec<String>,
}

impl ConditionalBlock {
    pub fn new(when: Predicate, items: &[&str]) -> Self {
        Self {
            when,
            items: texts(items),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRules {
    pub general: Vec<String>,
    pub by_level: Vec<LevelBlock>,
    pub conditional: Vec<ConditionalBlock>,
}

/// A hospitalization or ICU reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub description: String,
    pub when: Predicate,
}

impl Reason {
    pub fn new(description: &str, when: Predicate) -> Self {
        Self {
            description: description.to_string(),
            when,
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
    pub classification: ClassificationRules,
    pub medications: Vec<MedicationRule>,
    pub recommendations: RecommendationRules,
    pub hospitalization: Vec<Reason>,
    /// `None` when the protocol makes no ICU statement at all.
    pub icu: Option<Vec<Reason>>,
    pub discharge_criteria: Vec<String>,
}

impl ProtocolDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
