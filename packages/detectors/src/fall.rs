//! Three-phase fall detection over accelerometer magnitudes.
//!
//! A fall reads as freefall (magnitude collapses below ~2 m/s² while the
//! device drops), an impact spike, and post-impact stillness near gravity.
//! The scan walks every freefall run in the window; the earliest run with a
//! confirmed impact and stillness wins.

use roamguard_alerts::{Alert, AlertDetails, AlertPriority, AlertType};
use serde::{Deserialize, Serialize};

use crate::{DetectorError, SensorSample, magnitudes};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallConfig {
    /// Minimum window length before the detector runs at all.
    pub min_samples: usize,
    /// Magnitude ceiling (m/s²) for a sample to count as freefall.
    pub freefall_g_max: f64,
    /// Contiguous sub-ceiling samples required for a freefall phase.
    pub freefall_min_run: usize,
    /// Samples after the freefall run in which the impact must land.
    pub impact_lookahead: usize,
    /// Magnitude (m/s²) the impact spike must exceed.
    pub impact_g_threshold: f64,
    /// Samples after the impact scanned for stillness.
    pub stillness_lookahead: usize,
    /// Contiguous sub-threshold samples required for the stillness phase.
    pub stillness_min_run: usize,
    /// Magnitude ceiling (m/s²) for stillness. Rest sits near gravity
    /// (~9.8), so this must stay above that and below impact magnitudes.
    pub stillness_threshold: f64,
    /// Confidence reported on a confirmed fall.
    pub confidence: f64,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            freefall_g_max: 2.0,
            freefall_min_run: 3,
            impact_lookahead: 2,
            impact_g_threshold: 15.0,
            stillness_lookahead: 10,
            stillness_min_run: 5,
            stillness_threshold: 12.0,
            confidence: 0.75,
        }
    }
}

/// Scans the window for the freefall → impact → stillness sequence and
/// raises at most one `fall_detected` alert.
///
/// Windows shorter than `min_samples` never detect.
///
/// # Errors
///
/// Returns [`DetectorError::NonFiniteSample`] when a sample's magnitude is
/// NaN or infinite.
pub fn detect_fall(
    user_id: &str,
    samples: &[SensorSample],
    config: &FallConfig,
) -> Result<Option<Alert>, DetectorError> {
    if samples.len() < config.min_samples {
        return Ok(None);
    }
    let magnitudes = magnitudes(samples)?;

    let mut start = 0;
    while start < magnitudes.len() {
        if magnitudes[start] >= config.freefall_g_max {
            start += 1;
            continue;
        }
        // Maximal freefall run beginning at `start`.
        let mut end = start;
        while end < magnitudes.len() && magnitudes[end] < config.freefall_g_max {
            end += 1;
        }
        if end - start >= config.freefall_min_run {
            if let Some(alert) = confirm(user_id, samples, &magnitudes, start, end, config) {
                return Ok(Some(alert));
            }
        }
        start = end;
    }

    Ok(None)
}

/// Checks the impact and stillness phases behind the freefall run
/// `[run_start, run_end)`.
fn confirm(
    user_id: &str,
    samples: &[SensorSample],
    magnitudes: &[f64],
    run_start: usize,
    run_end: usize,
    config: &FallConfig,
) -> Option<Alert> {
    let impact_region_end = (run_end + config.impact_lookahead).min(magnitudes.len());
    let impact_index =
        (run_end..impact_region_end).find(|&i| magnitudes[i] > config.impact_g_threshold)?;

    let still_start = impact_index + 1;
    let still_end = (still_start + config.stillness_lookahead).min(magnitudes.len());
    let mut run = 0usize;
    let mut still = false;
    for &magnitude in &magnitudes[still_start..still_end] {
        if magnitude < config.stillness_threshold {
            run += 1;
            if run >= config.stillness_min_run {
                still = true;
                break;
            }
        } else {
            run = 0;
        }
    }
    if !still {
        return None;
    }

    let min_freefall_g = magnitudes[run_start..run_end]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let max_impact_g = magnitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Alert::new(
        user_id,
        AlertType::FallDetected,
        AlertPriority::Critical,
        config.confidence,
        "Fall detected: freefall, impact, and stillness pattern in motion data",
        samples.last()?.timestamp,
        AlertDetails::Fall {
            max_impact_g,
            min_freefall_g,
        },
    ))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone as _, Utc};

    use super::*;

    fn sample(seconds: i64, magnitude: f64) -> SensorSample {
        SensorSample {
            timestamp: base() + chrono::Duration::seconds(seconds),
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: magnitude,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap()
    }

    fn window(magnitudes: &[f64]) -> Vec<SensorSample> {
        magnitudes
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| sample(i64::try_from(i).unwrap(), magnitude))
            .collect()
    }

    fn fall_pattern() -> Vec<f64> {
        let mut magnitudes = vec![1.0; 10];
        magnitudes.extend(vec![25.0; 5]);
        magnitudes.extend(vec![10.0; 15]);
        magnitudes
    }

    #[test]
    fn detects_the_canonical_fall_pattern() {
        let samples = window(&fall_pattern());

        let alert = detect_fall("tourist-1", &samples, &FallConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(alert.alert_type, AlertType::FallDetected);
        assert_eq!(alert.priority, AlertPriority::Critical);
        assert!((alert.confidence - 0.75).abs() < f64::EPSILON);
        match alert.details {
            AlertDetails::Fall {
                max_impact_g,
                min_freefall_g,
            } => {
                assert!((max_impact_g - 25.0).abs() < 1e-9);
                assert!((min_freefall_g - 1.0).abs() < 1e-9);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn ordinary_walking_never_detects() {
        let samples = window(&[10.0; 50]);

        assert!(detect_fall("tourist-1", &samples, &FallConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn short_windows_never_detect() {
        let samples = window(&[1.0; 9]);

        assert!(detect_fall("tourist-1", &samples, &FallConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn freefall_without_impact_is_not_a_fall() {
        let mut magnitudes = vec![1.0; 10];
        magnitudes.extend(vec![10.0; 20]);
        let samples = window(&magnitudes);

        assert!(detect_fall("tourist-1", &samples, &FallConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn impact_without_stillness_is_not_a_fall() {
        let mut magnitudes = vec![1.0; 10];
        magnitudes.extend(vec![25.0; 20]);
        let samples = window(&magnitudes);

        assert!(detect_fall("tourist-1", &samples, &FallConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn detects_a_fall_after_a_walking_prefix() {
        let mut magnitudes = vec![10.0; 20];
        magnitudes.extend(fall_pattern());
        let samples = window(&magnitudes);

        let alert = detect_fall("tourist-1", &samples, &FallConfig::default()).unwrap();

        assert!(alert.is_some());
    }

    #[test]
    fn interrupted_freefall_runs_do_not_count() {
        // Two sub-threshold runs of 2, split by a normal sample.
        let mut magnitudes = vec![1.0, 1.0, 9.8, 1.0, 1.0];
        magnitudes.extend(vec![25.0; 2]);
        magnitudes.extend(vec![10.0; 10]);
        let samples = window(&magnitudes);

        assert!(detect_fall("tourist-1", &samples, &FallConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn non_finite_samples_error() {
        let mut samples = window(&fall_pattern());
        samples[3].accel_z = f64::NAN;

        let result = detect_fall("tourist-1", &samples, &FallConfig::default());

        assert!(matches!(
            result,
            Err(DetectorError::NonFiniteSample { index: 3 })
        ));
    }
}
