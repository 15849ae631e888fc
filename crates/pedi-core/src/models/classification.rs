use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The severity level a classification settled on.
///
/// `rank` is the position in the protocol's declared level order, 0 being
/// the least severe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LevelOutcome {
    pub id: String,
    pub label: String,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassificationResult {
    pub level: LevelOutcome,
    /// Sum of matched criterion weights. Only set by score-based protocols.
    pub score: Option<f64>,
    /// Descriptions of matched overrides and criteria, in declaration order.
    pub contributing_criteria: Vec<String>,
    /// Body-system tags with positive findings.
    pub systems_involved: BTreeSet<String>,
    /// True when a danger-sign override forced the level.
    pub overridden: bool,
}

impl ClassificationResult {
    pub fn is_level(&self, id: &str) -> bool {
        self.level.id == id
    }
}
