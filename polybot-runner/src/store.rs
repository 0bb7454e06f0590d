//! Storage contract for sealed simulations.
//!
//! The runner never persists anything by itself. Callers hand a
//! `SimulationStore` the `Simulation` they want kept; `InMemoryStore` is the
//! reference implementation and stores each record as JSON so a load always
//! goes through the same serde path a file or table backend would.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use polybot_core::domain::SimulationId;

use crate::simulation::{Simulation, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Save and load sealed simulations by id.
pub trait SimulationStore: Send + Sync {
    fn save(&self, simulation: &Simulation) -> Result<SimulationId, StoreError>;
    fn load(&self, id: &SimulationId) -> Result<Option<Simulation>, StoreError>;
    /// Stored ids, sorted.
    fn list(&self) -> Result<Vec<SimulationId>, StoreError>;
}

/// JSON-in-a-map store. Saving an existing id overwrites it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<SimulationId, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SimulationStore for InMemoryStore {
    fn save(&self, simulation: &Simulation) -> Result<SimulationId, StoreError> {
        let json = serde_json::to_string(simulation)?;
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.insert(simulation.id.clone(), json);
        Ok(simulation.id.clone())
    }

    fn load(&self, id: &SimulationId) -> Result<Option<Simulation>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let Some(json) = records.get(id) else {
            return Ok(None);
        };
        let simulation: Simulation = serde_json::from_str(json)?;
        if simulation.schema_version > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: simulation.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(Some(simulation))
    }

    fn list(&self) -> Result<Vec<SimulationId>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<SimulationId> = records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
