use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Unit attached to a computed dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DoseUnit {
    Mg,
    Mcg,
    G,
    Ml,
    MlPerHour,
    MlPerDay,
    Ui,
    UiPerHour,
    McgPerMinute,
    /// Metered-dose inhaler actuations.
    Puffs,
    Joules,
}

impl DoseUnit {
    pub fn label(&self) -> &'static str {
        match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::G => "g",
            DoseUnit::Ml => "mL",
            DoseUnit::MlPerHour => "mL/h",
            DoseUnit::MlPerDay => "mL/dia",
            DoseUnit::Ui => "UI",
            DoseUnit::UiPerHour => "UI/h",
            DoseUnit::McgPerMinute => "mcg/min",
            DoseUnit::Puffs => "jatos",
            DoseUnit::Joules => "J",
        }
    }

    /// Convert an amount in this unit to milligrams. `None` for units that
    /// are not a mass.
    pub fn to_milligrams(&self, amount: f64) -> Option<f64> {
        match self {
            DoseUnit::Mg => Some(amount),
            DoseUnit::Mcg => Some(amount / 1000.0),
            DoseUnit::G => Some(amount * 1000.0),
            _ => None,
        }
    }

    pub fn is_mass(&self) -> bool {
        self.to_milligrams(1.0).is_some()
    }
}

impl std::fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Mass of active substance per volume of solution, e.g. 250 mg / 5 mL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Concentration {
    pub numerator_mg: f64,
    pub denominator_ml: f64,
}

impl Concentration {
    pub fn new(numerator_mg: f64, denominator_ml: f64) -> Self {
        Self {
            numerator_mg,
            denominator_ml,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.numerator_mg.is_finite()
            && self.denominator_ml.is_finite()
            && self.numerator_mg > 0.0
            && self.denominator_ml > 0.0
    }

    pub fn mg_per_ml(&self) -> Result<f64, CoreError> {
        if !self.is_valid() {
            return Err(CoreError::InvalidConcentration {
                numerator_mg: self.numerator_mg,
                denominator_ml: self.denominator_ml,
            });
        }
        Ok(self.numerator_mg / self.denominator_ml)
    }

    /// Volume in mL that delivers `amount` of `unit`.
    pub fn volume_ml(&self, amount: f64, unit: DoseUnit) -> Result<f64, CoreError> {
        let mg = unit
            .to_milligrams(amount)
            .ok_or_else(|| CoreError::NotAMass(unit.label().to_string()))?;
        let volume = mg / self.mg_per_ml()?;
        if !volume.is_finite() {
            return Err(CoreError::NonFinite("volume"));
        }
        Ok(volume)
    }

    pub fn label(&self) -> String {
        format!("{} mg/{} mL", self.numerator_mg, self.denominator_ml)
    }
}

/// Rounding applied to a computed quantity before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Rounding {
    Exact,
    /// Round half away from zero to `places` decimal places.
    Decimals { places: u32 },
    /// Round up to a whole multiple of `step` (vials, puffs, tablets).
    CeilTo { step: f64 },
    NearestTo { step: f64 },
}

// Absorbs binary representation noise such as 0.1 * 30 = 3.0000000000000004.
const NOISE: f64 = 1e-9;

impl Rounding {
    pub fn one_decimal() -> Self {
        Rounding::Decimals { places: 1 }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Rounding::Exact | Rounding::Decimals { .. } => true,
            Rounding::CeilTo { step } | Rounding::NearestTo { step } => {
                step.is_finite() && *step > 0.0
            }
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Rounding::Exact => value,
            Rounding::Decimals { places } => {
                let factor = 10f64.powi(places as i32);
                let scaled = value * factor;
                (scaled + scaled.signum() * NOISE).round() / factor
            }
            Rounding::CeilTo { step } => (value / step - NOISE).ceil() * step,
            Rounding::NearestTo { step } => {
                let scaled = value / step;
                (scaled + scaled.signum() * NOISE).round() * step
            }
        }
    }

    /// Same granularity as [`Rounding::apply`], always towards zero. Used
    /// when rounding up would cross a dose limit.
    pub fn apply_down(&self, value: f64) -> f64 {
        match *self {
            Rounding::Exact => value,
            Rounding::Decimals { places } => {
                let factor = 10f64.powi(places as i32);
                (value * factor + NOISE).floor() / factor
            }
            Rounding::CeilTo { step } | Rounding::NearestTo { step } => {
                (value / step + NOISE).floor() * step
            }
        }
    }
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding::Decimals { places: 2 }
    }
}
