//! Behavioral distress detection over buffered device history.
//!
//! Four independent indicators, each worth a fixed confidence increment:
//! prolonged inactivity, erratic movement, an unusual distance from the
//! user's usual positions, and gaps in the combined upload stream. Two
//! triggered indicators (or a summed confidence strictly above the
//! trigger) raise a single medium-priority alert that always asks for
//! human verification before escalation.

use chrono::{DateTime, Utc};
use roamguard_alerts::{Alert, AlertDetails, AlertPriority, AlertType};
use roamguard_geo::{Coordinate, bearing_deg, distance_km};
use serde::{Deserialize, Serialize};

use crate::{DetectorError, LocationSample, SensorSample, elapsed_seconds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistressConfig {
    /// Trailing locations scanned for inactivity.
    pub inactivity_window: usize,
    /// Net displacement (km) under which the window counts as stationary.
    pub inactivity_displacement_km: f64,
    /// Hours the stationary window must span (inclusive boundary, so a
    /// window spanning exactly this long triggers).
    pub stationary_duration_hours: f64,
    pub inactivity_increment: f64,
    /// Trailing locations scanned for erratic movement.
    pub erratic_window: usize,
    /// Minimum locations before the erratic scan runs.
    pub erratic_min_samples: usize,
    /// Bearing change (degrees) that counts as a sharp turn.
    pub erratic_turn_deg: f64,
    /// Sharp turns must outnumber this fraction of the window's samples.
    pub erratic_ratio: f64,
    pub erratic_increment: f64,
    /// History points required before the unusual-location scan runs;
    /// below it the indicator is skipped, not failed.
    pub unusual_min_history: usize,
    /// Distance (km) from the mean historical position that counts as
    /// unusual.
    pub unusual_distance_km: f64,
    pub unusual_increment: f64,
    /// Trailing uploads of either kind scanned for signal gaps.
    pub signal_window: usize,
    /// Minimum buffered uploads before the signal-loss scan runs.
    pub signal_min_samples: usize,
    /// Consecutive-upload gap (minutes, strict) that counts as signal loss.
    pub signal_gap_minutes: f64,
    pub signal_loss_increment: f64,
    /// Indicator count that triggers an alert on its own.
    pub min_indicators: usize,
    /// Summed confidence must exceed this (strictly) to trigger below the
    /// indicator count.
    pub confidence_trigger: f64,
    /// Ceiling on the reported confidence.
    pub confidence_cap: f64,
}

impl Default for DistressConfig {
    fn default() -> Self {
        Self {
            inactivity_window: 20,
            inactivity_displacement_km: 0.1,
            stationary_duration_hours: 4.0,
            inactivity_increment: 0.3,
            erratic_window: 10,
            erratic_min_samples: 5,
            erratic_turn_deg: 45.0,
            erratic_ratio: 0.6,
            erratic_increment: 0.2,
            unusual_min_history: 10,
            unusual_distance_km: 10.0,
            unusual_increment: 0.3,
            signal_window: 10,
            signal_min_samples: 5,
            signal_gap_minutes: 30.0,
            signal_loss_increment: 0.2,
            min_indicators: 2,
            confidence_trigger: 0.5,
            confidence_cap: 0.9,
        }
    }
}

/// Evaluates the four distress indicators against the buffered location
/// and sensor history and raises at most one `distress_detected` alert
/// naming the triggered indicators. Movement indicators read the location
/// history; the signal-loss scan reads the timestamps of both streams.
///
/// # Errors
///
/// Returns [`DetectorError::NonFiniteSample`] when a location carries a
/// NaN or infinite coordinate.
pub fn detect_distress(
    user_id: &str,
    locations: &[LocationSample],
    samples: &[SensorSample],
    config: &DistressConfig,
) -> Result<Option<Alert>, DetectorError> {
    let Some(newest) = locations.last() else {
        return Ok(None);
    };
    for (index, location) in locations.iter().enumerate() {
        if !location.coordinate.latitude.is_finite() || !location.coordinate.longitude.is_finite()
        {
            return Err(DetectorError::NonFiniteSample { index });
        }
    }

    let mut indicators: Vec<&'static str> = Vec::new();
    let mut combined = 0.0;

    if prolonged_inactivity(locations, config) {
        indicators.push("prolonged_inactivity");
        combined += config.inactivity_increment;
    }
    if erratic_movement(locations, config) {
        indicators.push("erratic_movement");
        combined += config.erratic_increment;
    }
    if unusual_location(locations, config) {
        indicators.push("unusual_location");
        combined += config.unusual_increment;
    }
    if signal_loss(locations, samples, config) {
        indicators.push("signal_loss");
        combined += config.signal_loss_increment;
    }

    if indicators.len() < config.min_indicators && combined <= config.confidence_trigger {
        return Ok(None);
    }

    let message = format!("Possible distress: {}", indicators.join(", "));
    Ok(Some(Alert::new(
        user_id,
        AlertType::DistressDetected,
        AlertPriority::Medium,
        combined.min(config.confidence_cap),
        message,
        newest.timestamp,
        AlertDetails::Distress {
            indicators: indicators.iter().map(|name| (*name).to_string()).collect(),
            combined_confidence: combined,
        },
    )))
}

/// Barely any net displacement across a window that spans long enough.
fn prolonged_inactivity(locations: &[LocationSample], config: &DistressConfig) -> bool {
    let window = trailing(locations, config.inactivity_window);
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return false;
    };
    if window.len() < 2 {
        return false;
    }
    let Some(elapsed) = elapsed_seconds(first.timestamp, last.timestamp) else {
        return false;
    };

    distance_km(first.coordinate, last.coordinate) < config.inactivity_displacement_km
        && elapsed / 3600.0 >= config.stationary_duration_hours
}

/// Sharp turns across consecutive triples outnumbering the configured
/// share of the window's samples (not of its triples, of which there are
/// two fewer).
fn erratic_movement(locations: &[LocationSample], config: &DistressConfig) -> bool {
    let window = trailing(locations, config.erratic_window);
    if window.len() < config.erratic_min_samples.max(3) {
        return false;
    }
    let Some(count) = u32::try_from(window.len()).ok() else {
        return false;
    };

    let mut sharp: u32 = 0;
    for triple in window.windows(3) {
        let first = bearing_deg(triple[0].coordinate, triple[1].coordinate);
        let second = bearing_deg(triple[1].coordinate, triple[2].coordinate);
        let spread = (second - first).abs();
        let turn = spread.min(360.0 - spread);
        if turn > config.erratic_turn_deg {
            sharp += 1;
        }
    }

    f64::from(sharp) > config.erratic_ratio * f64::from(count)
}

/// Newest fix is far from the mean of the recorded history. Skipped (never
/// triggered) below the minimum history size.
fn unusual_location(locations: &[LocationSample], config: &DistressConfig) -> bool {
    if locations.len() < config.unusual_min_history {
        return false;
    }
    let Some(mean) = mean_position(locations) else {
        return false;
    };
    let newest = locations[locations.len() - 1];

    distance_km(newest.coordinate, mean) > config.unusual_distance_km
}

/// Any long gap between consecutive uploads of either kind inside the
/// trailing window. A steady sensor stream bridges sparse fixes, so only
/// a user whose device went fully quiet trips this.
fn signal_loss(
    locations: &[LocationSample],
    samples: &[SensorSample],
    config: &DistressConfig,
) -> bool {
    let mut timeline: Vec<DateTime<Utc>> = locations
        .iter()
        .map(|location| location.timestamp)
        .chain(samples.iter().map(|sample| sample.timestamp))
        .collect();
    if timeline.len() < config.signal_min_samples {
        return false;
    }
    timeline.sort_unstable();

    trailing(&timeline, config.signal_window)
        .windows(2)
        .any(|pair| {
            elapsed_seconds(pair[0], pair[1])
                .is_some_and(|seconds| seconds / 60.0 > config.signal_gap_minutes)
        })
}

fn trailing<T>(items: &[T], window: usize) -> &[T] {
    &items[items.len().saturating_sub(window)..]
}

fn mean_position(locations: &[LocationSample]) -> Option<Coordinate> {
    let count = u32::try_from(locations.len()).ok()?;
    if count == 0 {
        return None;
    }
    let (lat_sum, lng_sum) = locations.iter().fold((0.0, 0.0), |(lat, lng), location| {
        (
            lat + location.coordinate.latitude,
            lng + location.coordinate.longitude,
        )
    });

    Some(Coordinate {
        latitude: lat_sum / f64::from(count),
        longitude: lng_sum / f64::from(count),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone as _, Utc};

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 13, 20, 0, 0).unwrap()
    }

    fn fix(minutes: i64, latitude: f64, longitude: f64) -> LocationSample {
        LocationSample {
            timestamp: base() + chrono::Duration::minutes(minutes),
            coordinate: Coordinate {
                latitude,
                longitude,
            },
            speed_kmh: 0.0,
            accuracy_m: 10.0,
        }
    }

    fn imu(minutes: i64) -> SensorSample {
        SensorSample {
            timestamp: base() + chrono::Duration::minutes(minutes),
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 9.8,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        }
    }

    #[test]
    fn stationary_user_with_sparse_fixes_triggers() {
        // Five identical fixes an hour apart: stationary for four hours
        // with every gap above the signal threshold.
        let locations: Vec<LocationSample> =
            (0..5).map(|i| fix(i * 60, 26.9124, 75.7873)).collect();

        let alert = detect_distress("tourist-1", &locations, &[], &DistressConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(alert.alert_type, AlertType::DistressDetected);
        assert_eq!(alert.priority, AlertPriority::Medium);
        assert!(alert.requires_verification);
        assert!((alert.confidence - 0.5).abs() < 1e-9);
        assert!(alert.message.contains("prolonged_inactivity"));
        assert!(alert.message.contains("signal_loss"));
        match alert.details {
            AlertDetails::Distress { ref indicators, .. } => {
                assert_eq!(indicators.len(), 2);
            }
            ref other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn steady_sensor_stream_with_sparse_fixes_stays_quiet() {
        // Same resting fixes as above, but minute-by-minute IMU uploads
        // bridge every fix gap: the stream never reads as lost, and
        // inactivity alone does not trigger.
        let locations: Vec<LocationSample> =
            (0..5).map(|i| fix(i * 60, 26.9124, 75.7873)).collect();
        let samples: Vec<SensorSample> = (0..=240).map(imu).collect();

        let alert =
            detect_distress("tourist-1", &locations, &samples, &DistressConfig::default())
                .unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn a_single_fix_triggers_nothing() {
        let locations = vec![fix(0, 26.9124, 75.7873)];

        let alert =
            detect_distress("tourist-1", &locations, &[], &DistressConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn short_stationary_stretch_with_dense_fixes_is_calm() {
        // Two hours of identical fixes every 20 minutes: under the duration
        // threshold and under the gap threshold.
        let locations: Vec<LocationSample> =
            (0..7).map(|i| fix(i * 20, 26.9124, 75.7873)).collect();

        let alert =
            detect_distress("tourist-1", &locations, &[], &DistressConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn zigzag_walk_with_a_dropout_triggers_erratic_and_signal_loss() {
        // Alternating north/east hops every few minutes, with one 40-minute
        // dropout in the middle.
        let mut latitude = 26.9;
        let mut longitude = 75.8;
        let mut locations = Vec::new();
        for i in 0..10 {
            if i % 2 == 0 {
                latitude += 0.001;
            } else {
                longitude += 0.001;
            }
            let minutes = if i < 5 { i * 3 } else { i * 3 + 40 };
            locations.push(fix(minutes, latitude, longitude));
        }

        let alert = detect_distress("tourist-1", &locations, &[], &DistressConfig::default())
            .unwrap()
            .unwrap();

        assert!(alert.message.contains("erratic_movement"));
        assert!(alert.message.contains("signal_loss"));
    }

    #[test]
    fn jittery_fixes_at_rest_stay_quiet() {
        // Four and a half hours parked in one spot: the fix wobbles a few
        // meters east-west, then drifts slowly west. Five of the eight
        // triples turn sharply, short of 60% of the ten samples, so only
        // the inactivity indicator holds.
        let offsets = [
            0.0, 0.00007, 0.0, 0.00007, 0.0, 0.00007, 0.0, -0.00002, -0.00004, -0.00006,
        ];
        let locations: Vec<LocationSample> = (0..10)
            .zip(offsets)
            .map(|(i, offset)| fix(i * 30, 26.9, 75.8 + offset))
            .collect();

        let alert =
            detect_distress("tourist-1", &locations, &[], &DistressConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn steady_walk_stays_quiet() {
        // A straight northward walk, fix every 5 minutes.
        let mut latitude = 26.9;
        let locations: Vec<LocationSample> = (0..12)
            .map(|i| {
                latitude += 0.002;
                fix(i * 5, latitude, 75.8)
            })
            .collect();

        let alert =
            detect_distress("tourist-1", &locations, &[], &DistressConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn far_excursion_with_dropout_reports_unusual_location() {
        // A day around one spot, then a fix 20-odd km away after a long gap.
        let mut locations: Vec<LocationSample> =
            (0..12).map(|i| fix(i * 10, 26.9124, 75.7873)).collect();
        locations.push(fix(12 * 10 + 50, 27.1, 75.78));

        let alert = detect_distress("tourist-1", &locations, &[], &DistressConfig::default())
            .unwrap()
            .unwrap();

        assert!(alert.message.contains("unusual_location"));
        assert!(alert.message.contains("signal_loss"));
    }

    #[test]
    fn below_history_floor_unusual_location_is_skipped() {
        // Same excursion shape but too little history for the indicator;
        // the lone signal-loss gap is not enough to trigger.
        let mut locations: Vec<LocationSample> =
            (0..5).map(|i| fix(i * 10, 26.9124, 75.7873)).collect();
        locations.push(fix(5 * 10 + 50, 27.1, 75.78));

        let alert =
            detect_distress("tourist-1", &locations, &[], &DistressConfig::default()).unwrap();

        assert!(alert.is_none());
    }

    #[test]
    fn non_finite_coordinates_error() {
        let mut locations: Vec<LocationSample> =
            (0..5).map(|i| fix(i * 60, 26.9124, 75.7873)).collect();
        locations[1].coordinate.latitude = f64::NAN;

        let result = detect_distress("tourist-1", &locations, &[], &DistressConfig::default());

        assert!(matches!(
            result,
            Err(DetectorError::NonFiniteSample { index: 1 })
        ));
    }

    #[test]
    fn confidence_is_capped() {
        let config = DistressConfig {
            inactivity_increment: 0.6,
            signal_loss_increment: 0.6,
            ..DistressConfig::default()
        };
        let locations: Vec<LocationSample> =
            (0..5).map(|i| fix(i * 60, 26.9124, 75.7873)).collect();

        let alert = detect_distress("tourist-1", &locations, &[], &config)
            .unwrap()
            .unwrap();

        assert!((alert.confidence - 0.9).abs() < 1e-9);
        match alert.details {
            AlertDetails::Distress {
                combined_confidence,
                ..
            } => assert!((combined_confidence - 1.2).abs() < 1e-9),
            ref other => panic!("unexpected details {other:?}"),
        }
    }
}
