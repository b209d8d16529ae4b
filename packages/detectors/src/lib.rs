#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Rule-based safety detectors over bounded sensor windows.
//!
//! Each detector is a pure function: it reads a window of samples plus a
//! serde-loadable config carrying the documented thresholds and returns at
//! most one [`Alert`](roamguard_alerts::Alert) per invocation. Windowing and
//! per-user locking are the orchestrator's job; nothing here keeps state or
//! touches a clock, so identical windows always produce identical verdicts.

pub mod crash;
pub mod distress;
pub mod fall;

use chrono::{DateTime, Utc};
use roamguard_geo::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use crash::{CrashConfig, detect_crash};
pub use distress::{DistressConfig, detect_distress};
pub use fall::{FallConfig, detect_fall};

// ── Samples ─────────────────────────────────────────────────────────────────

/// One IMU reading. Acceleration in m/s², gyroscope in deg/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl SensorSample {
    /// Euclidean magnitude of the acceleration vector.
    #[must_use]
    pub fn accel_magnitude(&self) -> f64 {
        (self.accel_x.powi(2) + self.accel_y.powi(2) + self.accel_z.powi(2)).sqrt()
    }
}

/// One GPS fix with the speed the device reported alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub timestamp: DateTime<Utc>,
    pub coordinate: Coordinate,
    pub speed_kmh: f64,
    pub accuracy_m: f64,
}

/// Battery-tier processing hint supplied with each batch. The tier itself is
/// decided by the device; the engine only consumes it.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessingLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ProcessingLevel {
    /// Low skips the distress history scan; medium and high run everything.
    /// Sampling-rate differences between medium and high live on the device.
    #[must_use]
    pub const fn runs_distress(self) -> bool {
        !matches!(self, Self::Low)
    }
}

/// One upload from a device: IMU and location samples in chronological
/// order, plus the processing hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorBatch {
    pub user_id: String,
    #[serde(default)]
    pub sensor_samples: Vec<SensorSample>,
    #[serde(default)]
    pub location_samples: Vec<LocationSample>,
    #[serde(default)]
    pub processing_level: ProcessingLevel,
}

// ── Config & errors ─────────────────────────────────────────────────────────

/// All detector thresholds in one serde-loadable bundle.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub fall: FallConfig,
    pub crash: CrashConfig,
    pub distress: DistressConfig,
}

/// Detector failures. The orchestrator logs these per detector and keeps
/// the remaining detectors running.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("non-finite sensor value at sample {index}")]
    NonFiniteSample { index: usize },
}

// ── Shared helpers ──────────────────────────────────────────────────────────

/// Acceleration magnitudes for a window, rejecting NaN/infinite readings.
pub(crate) fn magnitudes(samples: &[SensorSample]) -> Result<Vec<f64>, DetectorError> {
    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let magnitude = sample.accel_magnitude();
            if magnitude.is_finite() {
                Ok(magnitude)
            } else {
                Err(DetectorError::NonFiniteSample { index })
            }
        })
        .collect()
}

/// Elapsed seconds from `from` to `to`; `None` when time does not move
/// forward between the two.
pub(crate) fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<f64> {
    let millis = u32::try_from((to - from).num_milliseconds()).ok()?;
    Some(f64::from(millis) / 1000.0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn at(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap() + chrono::Duration::seconds(i64::from(seconds))
    }

    #[test]
    fn accel_magnitude_is_euclidean() {
        let sample = SensorSample {
            timestamp: at(0),
            accel_x: 3.0,
            accel_y: 4.0,
            accel_z: 12.0,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        };

        assert!((sample.accel_magnitude() - 13.0).abs() < 1e-12);
    }

    #[test]
    fn elapsed_seconds_rejects_backwards_time() {
        assert_eq!(elapsed_seconds(at(10), at(5)), None);
        assert_eq!(elapsed_seconds(at(5), at(5)), Some(0.0));
        assert_eq!(elapsed_seconds(at(0), at(90)), Some(90.0));
    }

    #[test]
    fn processing_levels_gate_distress() {
        assert!(!ProcessingLevel::Low.runs_distress());
        assert!(ProcessingLevel::Medium.runs_distress());
        assert!(ProcessingLevel::High.runs_distress());
        assert_eq!(ProcessingLevel::default(), ProcessingLevel::Medium);
    }

    #[test]
    fn batch_deserializes_with_defaulted_fields() {
        let batch: SensorBatch =
            serde_json::from_str(r#"{"userId":"tourist-1"}"#).unwrap();

        assert_eq!(batch.user_id, "tourist-1");
        assert!(batch.sensor_samples.is_empty());
        assert_eq!(batch.processing_level, ProcessingLevel::Medium);
    }
}
