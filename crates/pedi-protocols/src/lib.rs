//! pedi-protocols
//!
//! The protocol calculation engine. Each supported clinical condition is an
//! immutable [`definition::ProtocolDefinition`]; the engine validates raw
//! patient parameters against it, classifies severity, computes capped and
//! rounded doses, and composes the recommendation bundle. Pure and
//! synchronous: no I/O, no shared mutable state.

pub mod check;
pub mod classify;
pub mod compose;
pub mod definition;
pub mod dose;
pub mod engine;
pub mod error;
pub mod formula;
pub mod predicate;
pub mod protocols;
pub mod registry;
pub mod validate;

pub use engine::{calculate, calculate_with};
pub use registry::Registry;
