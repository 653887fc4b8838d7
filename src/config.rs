//! Runtime configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OntoError, OntoResult};

/// Tunables for one ontology instance and the engine driving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// Label language used by name and fuzzy lookups.
    pub language: String,
    /// Rate at which the external loop polls the feeder.
    pub feeder_rate_hz: u32,
    /// Rate at which the external loop runs periodic reasoners.
    pub periodic_rate_hz: u32,
    /// Per-subscriber buffer of the notification hub.
    pub stream_capacity: usize,
    /// Weight applied when a statement carries none.
    pub default_weight: f64,
    /// Maximum normalized edit distance accepted by fuzzy lookups.
    pub fuzzy_threshold: f64,
    /// Echo every applied statement (versioned copies).
    pub versioning: bool,
    /// Instance name, fed as `myself` on engine start.
    pub name: Option<String>,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            feeder_rate_hz: 20,
            periodic_rate_hz: 100,
            stream_capacity: 1024,
            default_weight: 1.0,
            fuzzy_threshold: 0.5,
            versioning: false,
            name: None,
        }
    }
}

impl OntologyConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> OntoResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| OntoError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> OntoResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| OntoError::config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Rejects values the polling loop cannot honour.
    pub fn validate(&self) -> OntoResult<()> {
        if self.feeder_rate_hz == 0 || self.periodic_rate_hz == 0 {
            return Err(OntoError::config("rates must be at least 1 Hz"));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(OntoError::config(format!(
                "fuzzy_threshold {} is out of range [0.0, 1.0]",
                self.fuzzy_threshold
            )));
        }
        if self.language.trim().is_empty() {
            return Err(OntoError::config("language cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = OntologyConfig::from_json_str(r#"{"language": "fr", "feeder_rate_hz": 5}"#).unwrap();
        assert_eq!(config.language, "fr");
        assert_eq!(config.feeder_rate_hz, 5);
        assert_eq!(config.periodic_rate_hz, 100);
        assert!((config.default_weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_rate_is_rejected() {
        let err = OntologyConfig::from_json_str(r#"{"periodic_rate_hz": 0}"#).unwrap_err();
        assert!(format!("{err}").contains("rates"));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        assert!(OntologyConfig::from_json_str(r#"{"fuzzy_threshold": 2.0}"#).is_err());
    }
}
