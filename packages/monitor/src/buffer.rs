//! Per-user rolling sample history.
//!
//! Each active session keeps a bounded window of IMU samples and location
//! fixes. The window is trimmed on every ingest, both by age and by count,
//! so detector passes always see a predictable amount of history. Age is
//! measured against the newest sample rather than the wall clock, which
//! keeps replayed or backfilled data deterministic.

use chrono::{DateTime, Duration, Utc};
use roamguard_detectors::{LocationSample, SensorSample};
use serde::{Deserialize, Serialize};

/// Retention limits for a user's buffered samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum IMU samples kept per user.
    pub max_sensor_samples: usize,
    /// Maximum location fixes kept per user.
    pub max_location_samples: usize,
    /// Samples older than this, relative to the newest activity, are dropped.
    pub retention_hours: u32,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_sensor_samples: 1000,
            max_location_samples: 100,
            retention_hours: 24,
        }
    }
}

/// Rolling sensor and location history for one tracked user.
#[derive(Debug, Clone)]
pub struct UserBuffer {
    sensor_samples: Vec<SensorSample>,
    location_samples: Vec<LocationSample>,
    session_started: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl UserBuffer {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self {
            sensor_samples: Vec::new(),
            location_samples: Vec::new(),
            session_started: at,
            last_activity: at,
        }
    }

    /// Appends a batch of samples and trims the window to the configured
    /// limits. Batches are expected in chronological order; `last_activity`
    /// only ever moves forward.
    pub fn ingest(
        &mut self,
        sensor: &[SensorSample],
        locations: &[LocationSample],
        config: &BufferConfig,
    ) {
        self.sensor_samples.extend_from_slice(sensor);
        self.location_samples.extend_from_slice(locations);

        if let Some(sample) = sensor.last() {
            self.last_activity = self.last_activity.max(sample.timestamp);
        }
        if let Some(sample) = locations.last() {
            self.last_activity = self.last_activity.max(sample.timestamp);
        }

        self.trim(config);
    }

    fn trim(&mut self, config: &BufferConfig) {
        let cutoff = self.last_activity - Duration::hours(i64::from(config.retention_hours));
        self.sensor_samples.retain(|s| s.timestamp >= cutoff);
        self.location_samples.retain(|s| s.timestamp >= cutoff);

        if self.sensor_samples.len() > config.max_sensor_samples {
            let excess = self.sensor_samples.len() - config.max_sensor_samples;
            self.sensor_samples.drain(..excess);
        }
        if self.location_samples.len() > config.max_location_samples {
            let excess = self.location_samples.len() - config.max_location_samples;
            self.location_samples.drain(..excess);
        }
    }

    #[must_use]
    pub fn sensor_samples(&self) -> &[SensorSample] {
        &self.sensor_samples
    }

    #[must_use]
    pub fn location_samples(&self) -> &[LocationSample] {
        &self.location_samples
    }

    #[must_use]
    pub const fn session_started(&self) -> DateTime<Utc> {
        self.session_started
    }

    #[must_use]
    pub const fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }
}
