//! Dose formulas as a closed set of composable variants.
//!
//! A formula is evaluated against the validated patient parameters and
//! yields the raw (unrounded) amount, whether a cap limited it, and the
//! ceiling any cap imposes on the final reported amount.

use serde::{Deserialize, Serialize};

use pedi_core::models::params::PatientParameters;

// Tolerance when deciding whether a cap was strictly the limiting factor,
// so that 0.01 x 30 = 0.30000000000000004 does not count as capped at 0.3.
const CAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DoseFormula {
    /// `per_kg x weight`
    Linear { per_kg: f64 },
    Fixed { amount: f64 },
    /// `min(formula, max)`
    Capped { formula: Box<DoseFormula>, max: f64 },
    /// `max(formula, min)`
    Floored { formula: Box<DoseFormula>, min: f64 },
    /// `formula / doses`, e.g. a daily amount split into administrations.
    Divided { formula: Box<DoseFormula>, doses: u32 },
    /// `formula x factor`
    Scaled { formula: Box<DoseFormula>, factor: f64 },
    /// `formula x value of field`, e.g. Parkland's mL x kg x %burned.
    PerField {
        field: String,
        formula: Box<DoseFormula>,
    },
    /// First band whose exclusive upper weight bound exceeds the weight.
    WeightBands { bands: Vec<WeightBand> },
    /// Like `WeightBands`, but the band amount is per kg.
    PerKgBands { bands: Vec<WeightBand> },
    /// Daily maintenance fluid in mL: 100 mL/kg for the first 10 kg,
    /// 50 mL/kg for the next 10 kg, 20 mL/kg beyond 20 kg.
    HollidaySegar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBand {
    /// Exclusive upper bound in kg; `None` for the last, open-ended band.
    pub below_kg: Option<f64>,
    pub amount: f64,
}

impl WeightBand {
    pub fn below(below_kg: f64, amount: f64) -> Self {
        Self {
            below_kg: Some(below_kg),
            amount,
        }
    }

    pub fn rest(amount: f64) -> Self {
        Self {
            below_kg: None,
            amount,
        }
    }
}

/// Result of evaluating a formula before rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluated {
    pub amount: f64,
    pub capped: bool,
    /// Largest amount the caps allow, after any division or scaling.
    pub limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaError {
    MissingField(String),
    NoBand(f64),
}

impl DoseFormula {
    pub fn per_kg(per_kg: f64) -> Self {
        DoseFormula::Linear { per_kg }
    }

    pub fn fixed(amount: f64) -> Self {
        DoseFormula::Fixed { amount }
    }

    pub fn bands(bands: Vec<WeightBand>) -> Self {
        DoseFormula::WeightBands { bands }
    }

    pub fn per_kg_bands(bands: Vec<WeightBand>) -> Self {
        DoseFormula::PerKgBands { bands }
    }

    pub fn holliday_segar() -> Self {
        DoseFormula::HollidaySegar
    }

    pub fn capped(self, max: f64) -> Self {
        DoseFormula::Capped {
            formula: Box::new(self),
            max,
        }
    }

    pub fn floored(self, min: f64) -> Self {
        DoseFormula::Floored {
            formula: Box::new(self),
            min,
        }
    }

    pub fn divided(self, doses: u32) -> Self {
        DoseFormula::Divided {
            formula: Box::new(self),
            doses,
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        DoseFormula::Scaled {
            formula: Box::new(self),
            factor,
        }
    }

    pub fn per_field(self, field: &str) -> Self {
        DoseFormula::PerField {
            field: field.to_string(),
            formula: Box::new(self),
        }
    }

    pub fn evaluate(&self, params: &PatientParameters) -> Result<Evaluated, FormulaError> {
        let weight = params.weight_kg;
        match self {
            DoseFormula::Linear { per_kg } => Ok(uncapped(per_kg * weight)),
            DoseFormula::Fixed { amount } => Ok(uncapped(*amount)),
            DoseFormula::Capped { formula, max } => {
                let inner = formula.evaluate(params)?;
                Ok(Evaluated {
                    amount: inner.amount.min(*max),
                    capped: inner.capped || inner.amount > max + CAP_TOLERANCE,
                    limit: Some(inner.limit.map_or(*max, |l| l.min(*max))),
                })
            }
            DoseFormula::Floored { formula, min } => {
                let inner = formula.evaluate(params)?;
                Ok(Evaluated {
                    amount: inner.amount.max(*min),
                    ..inner
                })
            }
            DoseFormula::Divided { formula, doses } => {
                let inner = formula.evaluate(params)?;
                let n = f64::from(*doses);
                Ok(Evaluated {
                    amount: inner.amount / n,
                    capped: inner.capped,
                    limit: inner.limit.map(|l| l / n),
                })
            }
            DoseFormula::Scaled { formula, factor } => {
                let inner = formula.evaluate(params)?;
                Ok(Evaluated {
                    amount: inner.amount * factor,
                    capped: inner.capped,
                    limit: inner.limit.map(|l| l * factor),
                })
            }
            DoseFormula::PerField { field, formula } => {
                let value = params
                    .number(field)
                    .ok_or_else(|| FormulaError::MissingField(field.clone()))?;
                let inner = formula.evaluate(params)?;
                Ok(Evaluated {
                    amount: inner.amount * value,
                    capped: inner.capped,
                    limit: inner.limit.map(|l| l * value),
                })
            }
            DoseFormula::WeightBands { bands } => {
                band_for(bands, weight).map(|band| uncapped(band.amount))
            }
            DoseFormula::PerKgBands { bands } => {
                band_for(bands, weight).map(|band| uncapped(band.amount * weight))
            }
            DoseFormula::HollidaySegar => Ok(uncapped(holliday_segar_ml_per_day(weight))),
        }
    }

    /// Every constant in the formula tree, for load-time sanity checks.
    pub fn check(&self) -> Result<(), String> {
        match self {
            DoseFormula::Linear { per_kg } => positive("coefficient", *per_kg),
            DoseFormula::Fixed { amount } => positive("fixed amount", *amount),
            DoseFormula::Capped { formula, max } => {
                positive("cap", *max)?;
                formula.check()
            }
            DoseFormula::Floored { formula, min } => {
                positive("floor", *min)?;
                formula.check()?;
                if let Some(max) = formula.max_cap()
                    && *min > max
                {
                    return Err(format!("floor {min} exceeds cap {max}"));
                }
                Ok(())
            }
            DoseFormula::Divided { formula, doses } => {
                if *doses == 0 {
                    return Err("divided into zero doses".to_string());
                }
                formula.check()
            }
            DoseFormula::Scaled { formula, factor } => {
                positive("scale factor", *factor)?;
                formula.check()
            }
            DoseFormula::PerField { formula, .. } => formula.check(),
            DoseFormula::WeightBands { bands } | DoseFormula::PerKgBands { bands } => {
                if bands.is_empty() {
                    return Err("no weight bands".to_string());
                }
                let mut previous = 0.0;
                for (i, band) in bands.iter().enumerate() {
                    positive("band amount", band.amount)?;
                    match band.below_kg {
                        Some(bound) if bound > previous => previous = bound,
                        Some(bound) => {
                            return Err(format!("weight band bound {bound} is not ascending"));
                        }
                        None if i + 1 == bands.len() => {}
                        None => return Err("open-ended weight band is not last".to_string()),
                    }
                }
                if bands.last().is_some_and(|b| b.below_kg.is_some()) {
                    return Err("last weight band must be open-ended".to_string());
                }
                Ok(())
            }
            DoseFormula::HollidaySegar => Ok(()),
        }
    }

    /// Fields the formula reads besides weight.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            DoseFormula::PerField { field, formula } => {
                let mut fields = formula.fields();
                fields.push(field);
                fields
            }
            DoseFormula::Capped { formula, .. }
            | DoseFormula::Floored { formula, .. }
            | DoseFormula::Divided { formula, .. }
            | DoseFormula::Scaled { formula, .. } => formula.fields(),
            _ => Vec::new(),
        }
    }

    fn max_cap(&self) -> Option<f64> {
        match self {
            DoseFormula::Capped { formula, max } => {
                Some(formula.max_cap().map_or(*max, |inner| inner.min(*max)))
            }
            _ => None,
        }
    }
}

fn band_for(bands: &[WeightBand], weight: f64) -> Result<&WeightBand, FormulaError> {
    bands
        .iter()
        .find(|band| band.below_kg.is_none_or(|bound| weight < bound))
        .ok_or(FormulaError::NoBand(weight))
}

fn uncapped(amount: f64) -> Evaluated {
    Evaluated {
        amount,
        capped: false,
        limit: None,
    }
}

fn positive(what: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{what} must be a positive number, got {value}"))
    }
}

pub fn holliday_segar_ml_per_day(weight_kg: f64) -> f64 {
    if weight_kg <= 10.0 {
        100.0 * weight_kg
    } else if weight_kg <= 20.0 {
        1000.0 + 50.0 * (weight_kg - 10.0)
    } else {
        1500.0 + 20.0 * (weight_kg - 20.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pedi_core::models::params::FieldValue;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn patient(weight_kg: f64) -> PatientParameters {
        PatientParameters::new(weight_kg, 60.0, BTreeMap::new())
    }

    #[test]
    fn capped_linear_below_and_above_cap() {
        let adrenaline = DoseFormula::per_kg(0.01).capped(0.3);

        let light = adrenaline.evaluate(&patient(20.0)).unwrap();
        assert!(approx(light.amount, 0.2));
        assert!(!light.capped);

        let heavy = adrenaline.evaluate(&patient(40.0)).unwrap();
        assert!(approx(heavy.amount, 0.3));
        assert!(heavy.capped);
        assert_eq!(heavy.limit, Some(0.3));
    }

    #[test]
    fn exact_cap_is_not_reported_as_capped() {
        let adrenaline = DoseFormula::per_kg(0.01).capped(0.3);
        let at_cap = adrenaline.evaluate(&patient(30.0)).unwrap();
        assert!(approx(at_cap.amount, 0.3));
        assert!(!at_cap.capped);
    }

    #[test]
    fn divided_daily_cap_carries_capped_flag_and_limit() {
        let amoxicillin = DoseFormula::per_kg(50.0).capped(1500.0).divided(3);
        let result = amoxicillin.evaluate(&patient(40.0)).unwrap();
        assert!(approx(result.amount, 500.0));
        assert!(result.capped);
        assert_eq!(result.limit, Some(500.0));

        let small = amoxicillin.evaluate(&patient(5.0)).unwrap();
        assert!(approx(small.amount, 250.0 / 3.0));
        assert!(!small.capped);
    }

    #[test]
    fn per_field_multiplies_by_declared_value() {
        let mut values = BTreeMap::new();
        values.insert("superficie_queimada".to_string(), FieldValue::Number(20.0));
        let params = PatientParameters::new(15.0, 48.0, values);

        let parkland = DoseFormula::per_kg(4.0).per_field("superficie_queimada");
        assert!(approx(parkland.evaluate(&params).unwrap().amount, 1200.0));

        let missing = DoseFormula::per_kg(4.0).per_field("outro");
        assert_eq!(
            missing.evaluate(&params),
            Err(FormulaError::MissingField("outro".to_string()))
        );
    }

    #[test]
    fn weight_bands_pick_first_matching_band() {
        let penicillin = DoseFormula::bands(vec![
            WeightBand::below(27.0, 600_000.0),
            WeightBand::rest(1_200_000.0),
        ]);
        assert!(approx(penicillin.evaluate(&patient(26.9)).unwrap().amount, 600_000.0));
        assert!(approx(penicillin.evaluate(&patient(27.0)).unwrap().amount, 1_200_000.0));
    }

    #[test]
    fn per_kg_bands_scale_by_weight() {
        let oral_fluids = DoseFormula::per_kg_bands(vec![
            WeightBand::below(10.0, 130.0),
            WeightBand::below(20.0, 100.0),
            WeightBand::rest(80.0),
        ]);
        assert!(approx(oral_fluids.evaluate(&patient(8.0)).unwrap().amount, 1040.0));
        assert!(approx(oral_fluids.evaluate(&patient(15.0)).unwrap().amount, 1500.0));
        assert!(approx(oral_fluids.evaluate(&patient(25.0)).unwrap().amount, 2000.0));
    }

    #[test]
    fn holliday_segar_segments() {
        assert!(approx(holliday_segar_ml_per_day(8.0), 800.0));
        assert!(approx(holliday_segar_ml_per_day(15.0), 1250.0));
        assert!(approx(holliday_segar_ml_per_day(30.0), 1700.0));
    }

    #[test]
    fn check_rejects_bad_constants() {
        assert!(DoseFormula::per_kg(0.0).check().is_err());
        assert!(DoseFormula::per_kg(0.1).capped(-1.0).check().is_err());
        assert!(DoseFormula::per_kg(0.1).divided(0).check().is_err());
        assert!(DoseFormula::per_kg(0.1).capped(1.0).floored(2.0).check().is_err());
        assert!(
            DoseFormula::bands(vec![WeightBand::rest(1.0), WeightBand::below(10.0, 2.0)])
                .check()
                .is_err()
        );
        assert!(DoseFormula::per_kg(0.01).capped(0.3).check().is_ok());
    }
}
