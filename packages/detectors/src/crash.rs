//! Vehicle crash detection from speed history plus an IMU impact spike.
//!
//! Three gates, all required: the user was recently at vehicle speed, the
//! speed series shows hard deceleration (computed from the sample
//! timestamps), and the IMU window carries an impact spike. Pedestrian
//! motion fails the speed gate immediately, whatever the IMU says.

use roamguard_alerts::{Alert, AlertDetails, AlertPriority, AlertType};
use serde::{Deserialize, Serialize};

use crate::{DetectorError, LocationSample, SensorSample, elapsed_seconds, magnitudes};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashConfig {
    /// Location samples considered for the speed gate and deceleration.
    pub speed_window: usize,
    /// Max speed in the window must reach this (km/h) or the detector
    /// returns immediately.
    pub min_vehicle_speed_kmh: f64,
    /// Deceleration (m/s², negative) the window must fall below.
    pub deceleration_threshold_ms2: f64,
    /// IMU samples considered for the impact spike.
    pub imu_window: usize,
    /// Magnitude (m/s²) the impact spike must exceed.
    pub impact_g_threshold: f64,
    /// Confidence reported on a confirmed crash.
    pub confidence: f64,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            speed_window: 5,
            min_vehicle_speed_kmh: 25.0,
            deceleration_threshold_ms2: -8.0,
            imu_window: 10,
            impact_g_threshold: 20.0,
            confidence: 0.8,
        }
    }
}

/// Checks the trailing windows for the vehicle-speed gate, hard
/// deceleration, and an impact spike. A window spanning no forward time
/// never detects.
///
/// # Errors
///
/// Returns [`DetectorError::NonFiniteSample`] when a speed or magnitude in
/// the analyzed windows is NaN or infinite (index relative to the window).
pub fn detect_crash(
    user_id: &str,
    locations: &[LocationSample],
    imu: &[SensorSample],
    config: &CrashConfig,
) -> Result<Option<Alert>, DetectorError> {
    if locations.len() < config.speed_window {
        return Ok(None);
    }
    let window = &locations[locations.len() - config.speed_window..];
    for (index, location) in window.iter().enumerate() {
        if !location.speed_kmh.is_finite() {
            return Err(DetectorError::NonFiniteSample { index });
        }
    }

    let max_speed = window
        .iter()
        .map(|location| location.speed_kmh)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_speed < config.min_vehicle_speed_kmh {
        return Ok(None);
    }

    let first = &window[0];
    let last = &window[window.len() - 1];
    let Some(elapsed) = elapsed_seconds(first.timestamp, last.timestamp) else {
        return Ok(None);
    };
    if elapsed <= 0.0 {
        return Ok(None);
    }
    let deceleration = (last.speed_kmh - first.speed_kmh) / 3.6 / elapsed;
    if deceleration >= config.deceleration_threshold_ms2 {
        return Ok(None);
    }

    let imu_window = &imu[imu.len().saturating_sub(config.imu_window)..];
    let max_g_force = magnitudes(imu_window)?
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max);
    if max_g_force <= config.impact_g_threshold {
        return Ok(None);
    }

    Ok(Some(Alert::new(
        user_id,
        AlertType::CrashDetected,
        AlertPriority::Critical,
        config.confidence,
        "Vehicle crash detected: hard deceleration with impact spike",
        last.timestamp,
        AlertDetails::Crash {
            max_g_force,
            deceleration_ms2: deceleration,
            speed_before_kmh: first.speed_kmh,
            speed_after_kmh: last.speed_kmh,
        },
    )))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone as _, Utc};
    use roamguard_geo::Coordinate;

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap()
    }

    fn location(millis: i64, speed_kmh: f64) -> LocationSample {
        LocationSample {
            timestamp: base() + chrono::Duration::milliseconds(millis),
            coordinate: Coordinate {
                latitude: 26.9,
                longitude: 75.8,
            },
            speed_kmh,
            accuracy_m: 5.0,
        }
    }

    fn imu_sample(millis: i64, magnitude: f64) -> SensorSample {
        SensorSample {
            timestamp: base() + chrono::Duration::milliseconds(millis),
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: magnitude,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        }
    }

    /// 80 km/h to standstill inside two seconds.
    fn hard_stop() -> Vec<LocationSample> {
        [80.0, 60.0, 40.0, 20.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, &speed)| location(i64::try_from(i).unwrap() * 500, speed))
            .collect()
    }

    fn impact_imu() -> Vec<SensorSample> {
        let mut samples: Vec<SensorSample> = (0..9)
            .map(|i| imu_sample(i64::from(i) * 200, 9.8))
            .collect();
        samples.push(imu_sample(1800, 28.0));
        samples
    }

    #[test]
    fn detects_a_hard_stop_with_impact() {
        let alert = detect_crash("tourist-1", &hard_stop(), &impact_imu(), &CrashConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(alert.alert_type, AlertType::CrashDetected);
        assert_eq!(alert.priority, AlertPriority::Critical);
        assert!((alert.confidence - 0.8).abs() < f64::EPSILON);
        match alert.details {
            AlertDetails::Crash {
                max_g_force,
                deceleration_ms2,
                speed_before_kmh,
                speed_after_kmh,
            } => {
                assert!((max_g_force - 28.0).abs() < 1e-9);
                // -80 km/h over 2 s.
                assert!((deceleration_ms2 - (-80.0 / 3.6 / 2.0)).abs() < 1e-9);
                assert!((speed_before_kmh - 80.0).abs() < f64::EPSILON);
                assert!((speed_after_kmh - 0.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn walking_speeds_never_crash_whatever_the_imu_says() {
        let walk: Vec<LocationSample> = [5.0, 4.0, 3.0, 2.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, &speed)| location(i64::try_from(i).unwrap() * 500, speed))
            .collect();

        let alert =
            detect_crash("tourist-1", &walk, &impact_imu(), &CrashConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn hard_stop_without_impact_spike_is_not_a_crash() {
        let quiet_imu: Vec<SensorSample> =
            (0..10).map(|i| imu_sample(i64::from(i) * 200, 9.8)).collect();

        let alert =
            detect_crash("tourist-1", &hard_stop(), &quiet_imu, &CrashConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn gentle_braking_is_not_a_crash() {
        let braking: Vec<LocationSample> = [80.0, 75.0, 70.0, 65.0, 60.0]
            .iter()
            .enumerate()
            .map(|(i, &speed)| location(i64::try_from(i).unwrap() * 500, speed))
            .collect();

        let alert =
            detect_crash("tourist-1", &braking, &impact_imu(), &CrashConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn zero_elapsed_time_never_detects() {
        let frozen: Vec<LocationSample> =
            [80.0, 60.0, 40.0, 20.0, 0.0].iter().map(|&speed| location(0, speed)).collect();

        let alert =
            detect_crash("tourist-1", &frozen, &impact_imu(), &CrashConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn backwards_timestamps_never_detect() {
        let reversed: Vec<LocationSample> = [80.0, 60.0, 40.0, 20.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, &speed)| location(-i64::try_from(i).unwrap() * 500, speed))
            .collect();

        let alert =
            detect_crash("tourist-1", &reversed, &impact_imu(), &CrashConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn short_speed_history_never_detects() {
        let short: Vec<LocationSample> = vec![location(0, 80.0), location(500, 0.0)];

        let alert =
            detect_crash("tourist-1", &short, &impact_imu(), &CrashConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn non_finite_speed_errors() {
        let mut samples = hard_stop();
        samples[2].speed_kmh = f64::NAN;

        let result = detect_crash("tourist-1", &samples, &impact_imu(), &CrashConfig::default());

        assert!(matches!(
            result,
            Err(DetectorError::NonFiniteSample { index: 2 })
        ));
    }
}
