//! Monitor configuration.
//!
//! Every knob has a sensible default, so an empty TOML document (or no
//! config at all) yields a working monitor. Sections map onto the crates
//! they tune: `[detectors.*]` for the rule-based detectors, `[risk]` for
//! the area scorer, `[buffer]` for per-user retention.

use roamguard_alerts::AlertLog;
use roamguard_detectors::DetectorConfig;
use roamguard_risk::RiskConfig;
use roamguard_zones::{CLOSE_APPROACH_KM, NEARBY_RADIUS_KM};
use serde::{Deserialize, Serialize};

use crate::MonitorError;
use crate::buffer::BufferConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub detectors: DetectorConfig,
    pub risk: RiskConfig,
    pub buffer: BufferConfig,
    /// Radius of the restricted-zone proximity scan.
    pub nearby_radius_km: f64,
    /// Centroid distance at which an approach warning is attached.
    pub close_approach_km: f64,
    /// Battery percentage at or below which a critical alert fires.
    pub battery_critical_percent: f64,
    /// Minutes without fresh samples before a session counts as lost.
    pub stale_session_minutes: u32,
    /// Alert-log size cap; recording past it drops the oldest entries.
    pub max_alert_entries: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detectors: DetectorConfig::default(),
            risk: RiskConfig::default(),
            buffer: BufferConfig::default(),
            nearby_radius_km: NEARBY_RADIUS_KM,
            close_approach_km: CLOSE_APPROACH_KM,
            battery_critical_percent: 15.0,
            stale_session_minutes: 120,
            max_alert_entries: AlertLog::DEFAULT_MAX_ENTRIES,
        }
    }
}

impl MonitorConfig {
    /// Parses a TOML document, falling back to defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`] when the document is not valid TOML
    /// or a key has the wrong type.
    pub fn from_toml_str(raw: &str) -> Result<Self, MonitorError> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_seeded_deployment() {
        let config = MonitorConfig::default();

        assert!((config.nearby_radius_km - 2.0).abs() < f64::EPSILON);
        assert!((config.close_approach_km - 1.0).abs() < f64::EPSILON);
        assert!((config.battery_critical_percent - 15.0).abs() < f64::EPSILON);
        assert_eq!(config.stale_session_minutes, 120);
        assert_eq!(config.max_alert_entries, 500);
        assert_eq!(config.buffer.max_sensor_samples, 1000);
        assert_eq!(config.detectors.fall.min_samples, 10);
    }

    #[test]
    fn empty_document_parses_to_defaults() {
        let config = MonitorConfig::from_toml_str("").unwrap();

        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let raw = r#"
            nearby_radius_km = 3.0
            max_alert_entries = 250

            [detectors.fall]
            impact_g_threshold = 18.0

            [buffer]
            max_sensor_samples = 500

            [risk]
            night_adjustment = 2.0
        "#;

        let config = MonitorConfig::from_toml_str(raw).unwrap();

        assert!((config.nearby_radius_km - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.max_alert_entries, 250);
        assert!((config.detectors.fall.impact_g_threshold - 18.0).abs() < f64::EPSILON);
        assert_eq!(config.detectors.fall.min_samples, 10);
        assert_eq!(config.buffer.max_sensor_samples, 500);
        assert_eq!(config.buffer.max_location_samples, 100);
        assert!((config.risk.night_adjustment - 2.0).abs() < f64::EPSILON);
        assert!((config.close_approach_km - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_document_is_rejected() {
        let result = MonitorConfig::from_toml_str("nearby_radius_km = \"wide\"");

        assert!(matches!(result, Err(MonitorError::Config(_))));
    }
}
