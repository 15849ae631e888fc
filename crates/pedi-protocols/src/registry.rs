//! The protocol registry: an immutable, checked catalog keyed by id.
//!
//! Build it once at startup, before the first calculation, and share it
//! by reference (or `Arc`) afterwards. Nothing mutates it after
//! construction.

use std::collections::BTreeMap;

use serde_json::Value;

use pedi_core::models::result::CalculationOutcome;

use crate::definition::ProtocolDefinition;
use crate::error::{ConfigurationError, ProtocolError};
use crate::protocols;

#[derive(Debug, Clone)]
pub struct Registry {
    protocols: Vec<ProtocolDefinition>,
    index: BTreeMap<String, usize>,
}

impl Registry {
    /// Check every definition and index it. Fails on the first defect.
    pub fn new(definitions: Vec<ProtocolDefinition>) -> Result<Self, ConfigurationError> {
        let mut index = BTreeMap::new();
        for (i, def) in definitions.iter().enumerate() {
            def.check()?;
            if index.insert(def.id.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateProtocol(def.id.clone()));
            }
        }
        tracing::info!(count = definitions.len(), "protocol registry loaded");
        Ok(Self {
            protocols: definitions,
            index,
        })
    }

    /// The built-in catalog.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::new(protocols::all_protocols())
    }

    /// Load a catalog serialized as a JSON array of definitions.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let definitions: Vec<ProtocolDefinition> = serde_json::from_str(json)?;
        Ok(Self::new(definitions)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(&self.protocols)?)
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolDefinition> {
        self.index.get(id).map(|&i| &self.protocols[i])
    }

    /// Definitions in catalog order.
    pub fn protocols(&self) -> &[ProtocolDefinition] {
        &self.protocols
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn calculate(&self, protocol_id: &str, raw: &Value) -> Result<CalculationOutcome, ProtocolError> {
        crate::engine::calculate(self, protocol_id, raw)
    }
}
