//! Load-time consistency checks for protocol definitions.
//!
//! Anything that would otherwise surface as a wrong dose or a silent
//! default at calculation time is rejected here, before a registry accepts
//! the definition.

use std::collections::BTreeSet;

use pedi_core::models::params::{AGE_MONTHS, AGE_YEARS, FieldValue};

use crate::definition::{FieldKind, FieldSpec, Presence, ProtocolDefinition, Strategy};
use crate::error::ConfigurationError;
use crate::predicate::Predicate;
use crate::validate::{AGE, AGE_UNIT, AGE_UNIT_OPTIONS, WEIGHT};

impl ProtocolDefinition {
    pub fn check(&self) -> Result<(), ConfigurationError> {
        let checker = Checker { def: self };
        checker.fields()?;
        checker.classification()?;
        checker.medications()?;
        checker.recommendations()?;
        Ok(())
    }
}

struct Checker<'a> {
    def: &'a ProtocolDefinition,
}

impl Checker<'_> {
    fn protocol(&self) -> String {
        self.def.id.clone()
    }

    fn fields(&self) -> Result<(), ConfigurationError> {
        let mut seen = BTreeSet::new();
        for field in &self.def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigurationError::DuplicateField {
                    protocol: self.protocol(),
                    field: field.name.clone(),
                });
            }
            if field.name == AGE_MONTHS || field.name == AGE_YEARS {
                return Err(self.invalid_field(field, "shadows a derived age field"));
            }
            self.field(field)?;
        }

        for common in [WEIGHT, AGE] {
            match self.def.field(common) {
                Some(spec) if spec.is_numeric() && spec.presence == Presence::Required => {}
                Some(spec) => {
                    return Err(self.invalid_field(spec, "must be a required number"));
                }
                None => {
                    return Err(ConfigurationError::MissingCommonField {
                        protocol: self.protocol(),
                        field: common.to_string(),
                    });
                }
            }
        }
        match self.def.field(AGE_UNIT) {
            Some(FieldSpec {
                kind: FieldKind::Choice { options },
                ..
            }) if AGE_UNIT_OPTIONS.iter().all(|o| options.iter().any(|x| x == o)) => Ok(()),
            Some(spec) => Err(self.invalid_field(spec, "must offer the age unit options")),
            None => Err(ConfigurationError::MissingCommonField {
                protocol: self.protocol(),
                field: AGE_UNIT.to_string(),
            }),
        }
    }

    fn field(&self, field: &FieldSpec) -> Result<(), ConfigurationError> {
        match &field.kind {
            FieldKind::Number { min, max, integer } => {
                if let (Some(min), Some(max)) = (min, max)
                    && min.value > max.value
                {
                    return Err(self.invalid_field(field, "has an empty range"));
                }
                if let Presence::Default(value) = &field.presence {
                    let Some(n) = value.as_number() else {
                        return Err(self.invalid_field(field, "has a non-numeric default"));
                    };
                    let in_range = min.is_none_or(|b| b.admits_above(n))
                        && max.is_none_or(|b| b.admits_below(n))
                        && (!integer || n.fract() == 0.0);
                    if !in_range {
                        return Err(self.invalid_field(field, "has a default outside its range"));
                    }
                }
            }
            FieldKind::Boolean => {
                if let Presence::Default(value) = &field.presence
                    && value.as_bool().is_none()
                {
                    return Err(self.invalid_field(field, "has a non-boolean default"));
                }
            }
            FieldKind::Choice { options } => {
                if options.is_empty() {
                    return Err(self.invalid_field(field, "offers no options"));
                }
                if let Presence::Default(value) = &field.presence {
                    match value {
                        FieldValue::Text(text) if options.contains(text) => {}
                        _ => {
                            return Err(
                                self.invalid_field(field, "has a default that is not an option")
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn invalid_field(&self, field: &FieldSpec, detail: &str) -> ConfigurationError {
        ConfigurationError::InvalidField {
            protocol: self.protocol(),
            field: field.name.clone(),
            detail: detail.to_string(),
        }
    }

    fn level(&self, level: &str) -> Result<(), ConfigurationError> {
        if self.def.classification.level_rank(level).is_some() {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownLevel {
                protocol: self.protocol(),
                level: level.to_string(),
            })
        }
    }

    fn invalid_classification(&self, detail: String) -> ConfigurationError {
        ConfigurationError::InvalidClassification {
            protocol: self.protocol(),
            detail,
        }
    }

    fn classification(&self) -> Result<(), ConfigurationError> {
        let rules = &self.def.classification;
        if rules.levels.is_empty() {
            return Err(ConfigurationError::NoLevels {
                protocol: self.protocol(),
            });
        }
        let mut seen = BTreeSet::new();
        for level in &rules.levels {
            if !seen.insert(level.id.as_str()) {
                return Err(self.invalid_classification(format!("level '{}' declared twice", level.id)));
            }
        }

        for o in &rules.overrides {
            self.predicate(&format!("override '{}'", o.description), &o.when, false)?;
        }

        match &rules.strategy {
            Strategy::Scored {
                criteria,
                thresholds,
            } => {
                if criteria.is_empty() || thresholds.is_empty() {
                    return Err(self.invalid_classification(
                        "scored classification needs criteria and thresholds".to_string(),
                    ));
                }
                let mut min_score = 0.0;
                for c in criteria {
                    if !c.weight.is_finite() {
                        return Err(self.invalid_classification(format!(
                            "criterion '{}' has a non-finite weight",
                            c.description
                        )));
                    }
                    if c.weight < 0.0 {
                        min_score += c.weight;
                    }
                    self.predicate(&format!("criterion '{}'", c.description), &c.when, false)?;
                }
                let mut scores = BTreeSet::new();
                for t in thresholds {
                    self.level(&t.level)?;
                    if !t.min_score.is_finite() || !scores.insert(t.min_score.to_bits()) {
                        return Err(self.invalid_classification(format!(
                            "threshold {} is duplicated or not finite",
                            t.min_score
                        )));
                    }
                }
                let lowest = thresholds
                    .iter()
                    .map(|t| t.min_score)
                    .fold(f64::INFINITY, f64::min);
                if lowest > min_score {
                    return Err(ConfigurationError::UnreachableThresholds {
                        protocol: self.protocol(),
                        min_score,
                        lowest_threshold: lowest,
                    });
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
                self.level(met)?;
                self.level(not_met)?;
                if sets.is_empty() || *minimum == 0 || *minimum > sets.len() {
                    return Err(self.invalid_classification(format!(
                        "minimum of {minimum} matched sets is unreachable with {} sets",
                        sets.len()
                    )));
                }
                for p in prerequisites {
                    self.predicate(&format!("prerequisite '{}'", p.description), &p.when, false)?;
                }
                let mut tags = BTreeSet::new();
                for set in sets {
                    if set.findings.is_empty() {
                        return Err(
                            self.invalid_classification(format!("criterion set '{}' is empty", set.tag))
                        );
                    }
                    if !tags.insert(set.tag.as_str()) {
                        return Err(self.invalid_classification(format!(
                            "criterion set '{}' declared twice",
                            set.tag
                        )));
                    }
                    for f in &set.findings {
                        self.predicate(&format!("finding '{}'", f.description), &f.when, false)?;
                    }
                }
                let met_rank = self.def.classification.level_rank(met);
                for e in escalations {
                    self.level(&e.level)?;
                    if self.def.classification.level_rank(&e.level) <= met_rank {
                        return Err(self.invalid_classification(format!(
                            "escalation '{}' must rank above '{met}'",
                            e.description
                        )));
                    }
                    self.predicate(&format!("escalation '{}'", e.description), &e.when, false)?;
                }
            }
            Strategy::Direct { rules: direct } => {
                match direct.last() {
                    Some(last) if last.when == Predicate::Always => {}
                    _ => {
                        return Err(self.invalid_classification(
                            "direct rules must end with a catch-all".to_string(),
                        ));
                    }
                }
                for r in direct {
                    self.level(&r.level)?;
                    self.predicate(&format!("rule '{}'", r.description), &r.when, false)?;
                }
            }
        }
        Ok(())
    }

    fn medications(&self) -> Result<(), ConfigurationError> {
        let mut names = BTreeSet::new();
        for m in &self.def.medications {
            let invalid = |detail: String| ConfigurationError::InvalidMedication {
                protocol: self.protocol(),
                medication: m.name.clone(),
                detail,
            };
            if !names.insert(m.name.as_str()) {
                return Err(invalid("declared twice".to_string()));
            }
            m.formula.check().map_err(invalid)?;
            for field in m.formula.fields() {
                match self.def.field(field) {
                    Some(spec) if spec.is_numeric() && spec.presence != Presence::Unassessed => {}
                    Some(_) => {
                        return Err(invalid(format!(
                            "formula field '{field}' must be a number that is always present"
                        )));
                    }
                    None => return Err(invalid(format!("formula reads undeclared field '{field}'"))),
                }
            }
            if let Some(concentration) = &m.concentration {
                if !concentration.is_valid() {
                    return Err(invalid("concentration must be positive".to_string()));
                }
                if !m.unit.is_mass() {
                    return Err(invalid(format!(
                        "concentration needs a mass unit, got {}",
                        m.unit
                    )));
                }
            }
            if !m.rounding.is_valid() || !m.volume_rounding.is_valid() {
                return Err(invalid("rounding step must be positive".to_string()));
            }
            self.predicate(&format!("medication '{}'", m.name), &m.applies_when, true)?;
        }
        Ok(())
    }

    fn recommendations(&self) -> Result<(), ConfigurationError> {
        let recs = &self.def.recommendations;
        for block in &recs.by_level {
            self.level(&block.level)?;
        }
        for level in &self.def.classification.levels {
            let count = recs.by_level.iter().filter(|b| b.level == level.id).count();
            if count != 1 {
                return Err(ConfigurationError::MissingLevelBlock {
                    protocol: self.protocol(),
                    level: level.id.clone(),
                });
            }
        }
        for (i, block) in recs.conditional.iter().enumerate() {
            self.predicate(&format!("recommendation block #{}", i + 1), &block.when, true)?;
        }
        for r in &self.def.hospitalization {
            self.predicate(&format!("hospitalization reason '{}'", r.description), &r.when, true)?;
        }
        for r in self.def.icu.iter().flatten() {
            self.predicate(&format!("ICU reason '{}'", r.description), &r.when, true)?;
        }
        Ok(())
    }

    fn predicate(
        &self,
        context: &str,
        predicate: &Predicate,
        allow_classification: bool,
    ) -> Result<(), ConfigurationError> {
        let mut nodes = Vec::new();
        predicate.walk(&mut |p| nodes.push(p));
        for node in nodes {
            self.node(context, node, allow_classification)?;
        }
        Ok(())
    }

    fn node(
        &self,
        context: &str,
        node: &Predicate,
        allow_classification: bool,
    ) -> Result<(), ConfigurationError> {
        match node {
            Predicate::IsTrue { field } => self.field_kind(context, field, "a boolean", |k| {
                matches!(k, FieldKind::Boolean)
            }),
            Predicate::Equals { field, value } => self.option(context, field, value),
            Predicate::OneOf { field, values } => {
                values.iter().try_for_each(|v| self.option(context, field, v))
            }
            Predicate::Below { field, .. }
            | Predicate::AtMost { field, .. }
            | Predicate::AtLeast { field, .. }
            | Predicate::Above { field, .. }
            | Predicate::HypotensiveForAge { field } => {
                if field == AGE_MONTHS || field == AGE_YEARS {
                    return Ok(());
                }
                self.field_kind(context, field, "a number", |k| {
                    matches!(k, FieldKind::Number { .. })
                })
            }
            Predicate::Unassessed { field } => {
                let spec = self.def.field(field).ok_or_else(|| ConfigurationError::UnknownField {
                    protocol: self.protocol(),
                    context: context.to_string(),
                    field: field.to_string(),
                })?;
                if spec.presence == Presence::Unassessed {
                    Ok(())
                } else {
                    Err(ConfigurationError::FieldKindMismatch {
                        protocol: self.protocol(),
                        context: context.to_string(),
                        field: field.to_string(),
                        expected: "an unassessed-by-default field",
                    })
                }
            }
            Predicate::LevelIs { level } | Predicate::LevelAtLeast { level } => {
                if !allow_classification {
                    return Err(self.level_in_classification(context));
                }
                self.level(level)
            }
            Predicate::SystemInvolved { .. } if !allow_classification => {
                Err(self.level_in_classification(context))
            }
            _ => Ok(()),
        }
    }

    fn level_in_classification(&self, context: &str) -> ConfigurationError {
        ConfigurationError::LevelPredicateInClassification {
            protocol: self.protocol(),
            context: context.to_string(),
        }
    }

    fn field_kind(
        &self,
        context: &str,
        field: &str,
        expected: &'static str,
        accepts: impl Fn(&FieldKind) -> bool,
    ) -> Result<(), ConfigurationError> {
        let spec = self.def.field(field).ok_or_else(|| ConfigurationError::UnknownField {
            protocol: self.protocol(),
            context: context.to_string(),
            field: field.to_string(),
        })?;
        if accepts(&spec.kind) {
            Ok(())
        } else {
            Err(ConfigurationError::FieldKindMismatch {
                protocol: self.protocol(),
                context: context.to_string(),
                field: field.to_string(),
                expected,
            })
        }
    }

    fn option(&self, context: &str, field: &str, value: &str) -> Result<(), ConfigurationError> {
        self.field_kind(context, field, "a choice", |k| matches!(k, FieldKind::Choice { .. }))?;
        let known = matches!(
            self.def.field(field).map(|f| &f.kind),
            Some(FieldKind::Choice { options }) if options.iter().any(|o| o == value)
        );
        if known {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownOption {
                protocol: self.protocol(),
                context: context.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }
}
