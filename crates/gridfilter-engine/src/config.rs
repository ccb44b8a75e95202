//! Engine policy settings.

use serde::{Deserialize, Serialize};

use crate::complexity::ComplexityThresholds;

/// Undo history settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Snapshots kept before the oldest is evicted.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// All tunable engine policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub complexity: ComplexityThresholds,
    pub history: HistoryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.complexity.excellent_below, 10);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "history": { "capacity": 5 } }"#).unwrap();
        assert_eq!(config.history.capacity, 5);
        assert_eq!(config.complexity, ComplexityThresholds::default());
    }
}
