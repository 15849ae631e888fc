use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::units::{Concentration, DoseUnit};

/// Volume to administer for a mass dose of a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VolumeDose {
    pub ml: f64,
    pub concentration: Concentration,
}

/// One computed medication dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DoseResult {
    pub medication: String,
    pub amount: f64,
    pub unit: DoseUnit,
    /// The declared cap, not the weight-based amount, set the dose.
    pub capped: bool,
    pub route: String,
    pub frequency: Option<String>,
    pub volume: Option<VolumeDose>,
    pub note: Option<String>,
}

impl DoseResult {
    /// Short human-readable form, e.g. "Adrenalina IM: 0.2 mg IM (0.2 mL)".
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {} {} {}",
            self.medication, self.amount, self.unit, self.route
        );
        if let Some(volume) = &self.volume {
            line.push_str(&format!(" ({} mL de {})", volume.ml, volume.concentration.label()));
        }
        if let Some(frequency) = &self.frequency {
            line.push_str(&format!(", {frequency}"));
        }
        line
    }
}
