//! Engine configuration.
//!
//! Every field has a default, so a JSON document only needs the fields it
//! changes:
//!
//! ```
//! use sblp_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "driver": { "step_ms": 10 } }"#).unwrap();
//! assert_eq!(config.driver.step_ms, 10);
//! assert_eq!(config.repeat_interval_ms, 200);
//! ```

use sblp_core::timeline::Millis;
use serde::{Deserialize, Serialize};

use crate::driver::DriverConfig;
use crate::simulation::RemovalConfig;
use crate::EngineError;

/// Top-level configuration for a match and its screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub driver: DriverConfig,
    pub removal: RemovalConfig,
    /// Interval between impulses of a held key.
    pub repeat_interval_ms: Millis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            removal: RemovalConfig::default(),
            repeat_interval_ms: 200,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values the driver and input layer would otherwise assert on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.driver.step_ms <= 0 {
            return Err(EngineError::Config(format!(
                "driver.step_ms must be positive, got {}",
                self.driver.step_ms
            )));
        }
        if self.driver.max_ticks_per_advance == Some(0) {
            return Err(EngineError::Config(
                "driver.max_ticks_per_advance must be at least 1".to_owned(),
            ));
        }
        if !(self.removal.cull_margin.is_finite() && self.removal.cull_margin >= 0.0) {
            return Err(EngineError::Config(format!(
                "removal.cull_margin must be finite and non-negative, got {}",
                self.removal.cull_margin
            )));
        }
        if self.repeat_interval_ms <= 0 {
            return Err(EngineError::Config(format!(
                "repeat_interval_ms must be positive, got {}",
                self.repeat_interval_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.driver.step_ms, 16);
        assert_eq!(config.removal.cull_margin, 64.0);
    }

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = EngineConfig::from_json_str(
            r#"{ "driver": { "max_ticks_per_advance": 8 }, "removal": { "cull_margin": 10.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.driver.step_ms, 16);
        assert_eq!(config.driver.max_ticks_per_advance, Some(8));
        assert_eq!(config.removal.cull_margin, 10.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for json in [
            r#"{ "driver": { "step_ms": 0 } }"#,
            r#"{ "driver": { "max_ticks_per_advance": 0 } }"#,
            r#"{ "removal": { "cull_margin": -1.0 } }"#,
            r#"{ "repeat_interval_ms": -5 }"#,
        ] {
            let err = EngineConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, EngineError::Config(_)), "{json}: {err}");
        }
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EngineConfig::from_json_str("{ driver: ").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration: malformed config"));
    }
}
