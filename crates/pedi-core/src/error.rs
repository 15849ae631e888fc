use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid concentration {numerator_mg} mg / {denominator_ml} mL")]
    InvalidConcentration {
        numerator_mg: f64,
        denominator_ml: f64,
    },

    #[error("unit '{0}' cannot be converted to a volume")]
    NotAMass(String),

    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
}
