//! Configuration types and defaults for the annotator

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::highlight::error::ConfigError;

// =============================================================================
// Sensitivity
// =============================================================================

/// How eagerly detections are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Keep every detection
    #[default]
    Strict,
    /// Drop severity 0
    Balanced,
    /// Drop severity 0 and 1
    Lenient,
}

impl Sensitivity {
    /// Lowest severity a span must have to be kept.
    pub fn min_severity(self) -> u8 {
        match self {
            Sensitivity::Strict => 0,
            Sensitivity::Balanced => 1,
            Sensitivity::Lenient => 2,
        }
    }
}

// =============================================================================
// Annotator Configuration
// =============================================================================

/// Annotator settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Quiet period after the last edit before analysis. Default: 500
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Severity filter applied before resolving. Default: strict
    #[serde(default)]
    pub sensitivity: Sensitivity,
    /// Upper bound on spans accepted from one response. Default: 10000
    #[serde(default = "default_max_spans")]
    pub max_spans: usize,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_max_spans() -> usize {
    10_000
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            sensitivity: Sensitivity::default(),
            max_spans: default_max_spans(),
        }
    }
}

impl AnnotatorConfig {
    /// Responsive typing preset for the dashboard editor.
    pub fn realtime() -> Self {
        Self {
            debounce_ms: 300,
            ..Self::default()
        }
    }

    /// Browser extension preset.
    pub fn extension() -> Self {
        Self {
            sensitivity: Sensitivity::Balanced,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.sensitivity, Sensitivity::Strict);
        assert_eq!(config.max_spans, 10_000);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(AnnotatorConfig::from_json("{}").unwrap(), AnnotatorConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = AnnotatorConfig::from_json(r#"{"debounce_ms": 250, "sensitivity": "lenient"}"#)
            .unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.sensitivity.min_severity(), 2);
        assert_eq!(config.max_spans, 10_000);
    }

    #[test]
    fn test_bad_json() {
        let err = AnnotatorConfig::from_json(r#"{"sensitivity": "paranoid"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_presets() {
        assert_eq!(AnnotatorConfig::realtime().debounce_ms, 300);
        assert_eq!(AnnotatorConfig::extension().sensitivity, Sensitivity::Balanced);
    }
}
