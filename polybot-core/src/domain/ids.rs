use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic configuration hash (BLAKE3 of the canonical config JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First `n` hex characters, for human-facing identifiers.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(self.0.len())]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulation identifier, e.g. `SIM-3f2a9c01b7d4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimulationId(pub String);

impl SimulationId {
    /// Derive an identifier from the run's content: strategy hash, data span
    /// and seed. Identical inputs give identical ids.
    pub fn derive(config_hash: &ConfigHash, dataset_key: &str, seed: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(config_hash.0.as_bytes());
        hasher.update(dataset_key.as_bytes());
        hasher.update(&seed.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        Self(format!("SIM-{}", &hex.as_str()[..12]))
    }
}

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade identifier scoped to its simulation, e.g. `SIM-3f2a9c01b7d4-T0007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub String);

impl TradeId {
    pub fn new(simulation: &SimulationId, sequence: usize) -> Self {
        Self(format!("{}-T{:04}", simulation.0, sequence))
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_id_deterministic() {
        let h = ConfigHash::from_bytes(b"strategy");
        assert_eq!(
            SimulationId::derive(&h, "BTCUSDT:0:1000", 42),
            SimulationId::derive(&h, "BTCUSDT:0:1000", 42)
        );
    }

    #[test]
    fn simulation_id_changes_with_seed() {
        let h = ConfigHash::from_bytes(b"strategy");
        assert_ne!(
            SimulationId::derive(&h, "BTCUSDT:0:1000", 42),
            SimulationId::derive(&h, "BTCUSDT:0:1000", 43)
        );
    }

    #[test]
    fn trade_id_is_zero_padded() {
        let sim = SimulationId("SIM-abc".into());
        assert_eq!(TradeId::new(&sim, 7).0, "SIM-abc-T0007");
        assert!(SimulationId::derive(&ConfigHash::from_bytes(b"x"), "", 0)
            .0
            .starts_with("SIM-"));
    }
}
