//! Canned incident scenarios replayed through a live monitor.
//!
//! Each scenario is built from the same sample shapes a companion app
//! would upload, so the full pipeline runs: buffering, detection, zone
//! checks and alert delivery. Timestamps are synthesized backwards from
//! now so the windows line up the way live traffic would.

use chrono::{DateTime, Duration, Utc};
use roamguard_detectors::{LocationSample, ProcessingLevel, SensorBatch, SensorSample};
use roamguard_geo::Coordinate;
use roamguard_monitor::SafetyMonitor;

const DEMO_USER: &str = "demo-tourist";

pub const ALL: &[&str] = &["fall", "crash", "distress", "breach-walk"];

/// Runs one named scenario.
///
/// # Errors
///
/// Returns an error for a scenario name not listed in [`ALL`].
pub fn run(monitor: &SafetyMonitor, scenario: &str) -> Result<(), Box<dyn std::error::Error>> {
    match scenario {
        "fall" => fall(monitor),
        "crash" => crash(monitor),
        "distress" => distress(monitor),
        "breach-walk" => breach_walk(monitor),
        other => {
            return Err(
                format!("Unknown scenario: {other} (available: {})", ALL.join(", ")).into(),
            );
        }
    }
    Ok(())
}

/// Free fall, impact and post-impact stillness near Amber Fort.
fn fall(monitor: &SafetyMonitor) {
    println!("Simulating a fall on the Amber Fort steps");

    let now = Utc::now();
    let start = now - Duration::seconds(29);
    let mut samples = Vec::new();
    let mut offset = 0;
    for _ in 0..10 {
        samples.push(sensor(start + Duration::seconds(offset), 1.2));
        offset += 1;
    }
    for _ in 0..5 {
        samples.push(sensor(start + Duration::seconds(offset), 24.0));
        offset += 1;
    }
    for _ in 0..15 {
        samples.push(sensor(start + Duration::seconds(offset), 9.8));
        offset += 1;
    }

    let alerts = monitor.process_sensor_batch(&SensorBatch {
        user_id: DEMO_USER.to_string(),
        sensor_samples: samples,
        location_samples: vec![fix(now, 26.9855, 75.8513, 0.0)],
        processing_level: ProcessingLevel::High,
    });
    println!("{} alert(s) raised by the batch", alerts.len());
}

/// Hard stop from highway speed with an impact spike on the IMU.
fn crash(monitor: &SafetyMonitor) {
    println!("Simulating a vehicle crash on the Jaipur bypass");

    let now = Utc::now();
    let start = now - Duration::seconds(2);
    let speeds = [82.0, 64.0, 43.0, 21.0, 0.0];

    let mut locations = Vec::new();
    let mut latitude = 26.9000;
    let mut offset_ms = 0;
    for speed in speeds {
        locations.push(fix(
            start + Duration::milliseconds(offset_ms),
            latitude,
            75.7500,
            speed,
        ));
        latitude += 0.0001;
        offset_ms += 500;
    }

    let mut imu = Vec::new();
    let mut offset_ms = 0;
    for _ in 0..9 {
        imu.push(sensor(start + Duration::milliseconds(offset_ms), 9.8));
        offset_ms += 200;
    }
    imu.push(sensor(start + Duration::milliseconds(offset_ms), 27.0));

    let alerts = monitor.process_sensor_batch(&SensorBatch {
        user_id: DEMO_USER.to_string(),
        sensor_samples: imu,
        location_samples: locations,
        processing_level: ProcessingLevel::High,
    });
    println!("{} alert(s) raised by the batch", alerts.len());
}

/// Four hours without movement in the desert outside Jaisalmer.
fn distress(monitor: &SafetyMonitor) {
    println!("Simulating a stranded tourist in the Thar desert");

    let now = Utc::now();
    let start = now - Duration::hours(4);
    let mut locations = Vec::new();
    let mut offset_minutes = 0;
    for _ in 0..5 {
        locations.push(fix(
            start + Duration::minutes(offset_minutes),
            27.1234,
            71.5678,
            0.0,
        ));
        offset_minutes += 60;
    }

    let alerts = monitor.process_sensor_batch(&SensorBatch {
        user_id: DEMO_USER.to_string(),
        sensor_samples: vec![],
        location_samples: locations,
        processing_level: ProcessingLevel::High,
    });
    println!("{} alert(s) raised by the batch", alerts.len());
}

/// A walk from Jaipur Junction up to and across the military zone boundary.
fn breach_walk(monitor: &SafetyMonitor) {
    println!("Walking from Jaipur Junction into the restricted cantonment");

    let path = [
        ("Jaipur Junction forecourt", 26.9196, 75.7880),
        ("Approaching the boundary wall", 26.9140, 75.7915),
        ("Past the fence line", 26.9113, 75.7911),
    ];

    for (label, latitude, longitude) in path {
        let assessment = monitor.check_location(
            DEMO_USER,
            Coordinate {
                latitude,
                longitude,
            },
            Utc::now(),
        );
        println!(
            "{label}: risk {:.2}/10 ({}), {}",
            assessment.overall_risk_score,
            assessment.risk_level,
            if assessment.is_safe { "safe" } else { "caution advised" }
        );
        for line in &assessment.alerts {
            println!("  ! {line}");
        }
    }
}

fn sensor(at: DateTime<Utc>, magnitude: f64) -> SensorSample {
    SensorSample {
        timestamp: at,
        accel_x: 0.0,
        accel_y: 0.0,
        accel_z: magnitude,
        gyro_x: 0.0,
        gyro_y: 0.0,
        gyro_z: 0.0,
    }
}

fn fix(at: DateTime<Utc>, latitude: f64, longitude: f64, speed_kmh: f64) -> LocationSample {
    LocationSample {
        timestamp: at,
        coordinate: Coordinate {
            latitude,
            longitude,
        },
        speed_kmh,
        accuracy_m: 8.0,
    }
}
