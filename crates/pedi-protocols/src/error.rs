use thiserror::Error;

use pedi_core::error::CoreError;

/// A protocol definition is internally inconsistent. These are defects in
/// static data, reported at registry load time where possible.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("duplicate protocol id '{0}'")]
    DuplicateProtocol(String),

    #[error("protocol '{protocol}' declares field '{field}' more than once")]
    DuplicateField { protocol: String, field: String },

    #[error("protocol '{protocol}' does not declare the common field '{field}'")]
    MissingCommonField { protocol: String, field: String },

    #[error("protocol '{protocol}': field '{field}' {detail}")]
    InvalidField {
        protocol: String,
        field: String,
        detail: String,
    },

    #[error("protocol '{protocol}' declares no severity levels")]
    NoLevels { protocol: String },

    #[error("protocol '{protocol}' references undeclared level '{level}'")]
    UnknownLevel { protocol: String, level: String },

    #[error("protocol '{protocol}': {context} references undeclared field '{field}'")]
    UnknownField {
        protocol: String,
        context: String,
        field: String,
    },

    #[error("protocol '{protocol}': {context} uses field '{field}' as {expected}")]
    FieldKindMismatch {
        protocol: String,
        context: String,
        field: String,
        expected: &'static str,
    },

    #[error("protocol '{protocol}': {context} compares '{field}' with undeclared option '{value}'")]
    UnknownOption {
        protocol: String,
        context: String,
        field: String,
        value: String,
    },

    #[error("protocol '{protocol}': classification rules cannot depend on level or systems ({context})")]
    LevelPredicateInClassification { protocol: String, context: String },

    #[error("protocol '{protocol}': {detail}")]
    InvalidClassification { protocol: String, detail: String },

    #[error(
        "protocol '{protocol}': lowest threshold {lowest_threshold} is above the minimum reachable score {min_score}"
    )]
    UnreachableThresholds {
        protocol: String,
        min_score: f64,
        lowest_threshold: f64,
    },

    #[error("protocol '{protocol}': no threshold or rule matched, classification is incomplete")]
    NoMatchingClassification { protocol: String },

    #[error("protocol '{protocol}', medication '{medication}': {detail}")]
    InvalidMedication {
        protocol: String,
        medication: String,
        detail: String,
    },

    #[error("protocol '{protocol}' has no recommendation block for level '{level}'")]
    MissingLevelBlock { protocol: String, level: String },
}

/// An arithmetic failure while computing a dose.
#[derive(Debug, Error)]
pub enum ComputationError {
    #[error("protocol '{protocol}', medication '{medication}': non-finite result")]
    NonFinite { protocol: String, medication: String },

    #[error("protocol '{protocol}', medication '{medication}': negative dose {amount}")]
    Negative {
        protocol: String,
        medication: String,
        amount: f64,
    },

    #[error("protocol '{protocol}', medication '{medication}': {source}")]
    Conversion {
        protocol: String,
        medication: String,
        #[source]
        source: CoreError,
    },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),

    #[error("catalog parse error: {0}")]
    Catalog(#[from] serde_json::Error),
}
