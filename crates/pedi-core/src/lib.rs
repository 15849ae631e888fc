//! pedi-core
//!
//! Pure domain types shared by the protocol engine, the export helpers and
//! the HTTP service: patient parameters, dose units, calculation results and
//! validation errors. No I/O.

pub mod error;
pub mod models;
pub mod units;
