//! pedi-export
//!
//! Clipboard text and DOCX handouts built from a finished
//! `CalculationResult`. Nothing here feeds back into the engine.

pub mod docx;
pub mod error;
pub mod render;
pub mod styles;
