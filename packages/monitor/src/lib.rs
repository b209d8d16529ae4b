#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Safety monitoring orchestrator.
//!
//! [`SafetyMonitor`] ties the lower crates together: the zone store for
//! breach and proximity checks, the area scorer for location risk, the
//! rule-based detectors over per-user sample buffers, and the alert log
//! plus a pluggable [`AlertSink`] for delivery. One monitor serves every
//! tracked user; all entry points take `&self` and are safe to call from
//! multiple threads.
//!
//! Monitoring never fails outward. A poisoned lock is recovered, a failing
//! detector is logged and skipped, and an unscorable location falls back
//! to the neutral assessment. Only zone administration and config parsing
//! return errors, since their callers can act on them.

pub mod buffer;
pub mod config;

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use chrono::{DateTime, Duration, Utc};
use roamguard_alerts::{Alert, AlertDetails, AlertLog, AlertPriority, AlertSink, AlertType};
use roamguard_detectors::{SensorBatch, detect_crash, detect_distress, detect_fall};
use roamguard_geo::Coordinate;
use roamguard_risk::{
    AreaRiskScorer, MAX_RECOMMENDATIONS, MAX_SCORE, NearestArea, RiskLevel, TouristArea,
    is_safe_score,
};
use roamguard_zones::{RedZone, ZoneDefinition, ZoneError, ZoneStore, ZoneType};
use serde::Serialize;
use thiserror::Error;

pub use buffer::{BufferConfig, UserBuffer};
pub use config::MonitorConfig;

/// Breach floor applied per zone risk level: level 5 pins the score at 10.
const BREACH_FLOOR_PER_LEVEL: f64 = 2.0;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid monitor configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

// ── Assessment ──────────────────────────────────────────────────────────────

/// Zone the queried point is currently inside.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachedZone {
    pub zone_id: u64,
    pub name: String,
    pub zone_type: ZoneType,
    pub risk_level: u8,
}

/// A restricted zone within the proximity scan radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneProximity {
    pub zone_id: u64,
    pub name: String,
    pub zone_type: ZoneType,
    pub risk_level: u8,
    pub distance_km: f64,
}

/// Combined verdict for one coordinate at one instant: area scoring merged
/// with zone breach and proximity findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    pub is_safe: bool,
    pub zone_breach: Option<BreachedZone>,
    /// Zones within the scan radius, nearest first.
    pub nearby_zones: Vec<ZoneProximity>,
    pub nearest_area: Option<NearestArea>,
    pub risk_breakdown: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
}

// ── Monitor ─────────────────────────────────────────────────────────────────

/// Shared safety engine for all tracked users.
///
/// Lock order is fixed: the buffer map is never held while a per-user
/// buffer lock is taken out of it and used, and the alert log is always
/// taken last.
pub struct SafetyMonitor {
    zones: RwLock<ZoneStore>,
    scorer: AreaRiskScorer,
    config: MonitorConfig,
    buffers: RwLock<HashMap<String, Arc<Mutex<UserBuffer>>>>,
    alert_log: Mutex<AlertLog>,
    sink: Arc<dyn AlertSink>,
}

impl SafetyMonitor {
    #[must_use]
    pub fn new(
        zones: ZoneStore,
        areas: Vec<TouristArea>,
        config: MonitorConfig,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        let scorer = AreaRiskScorer::with_config(areas, config.risk.clone());
        let alert_log = Mutex::new(AlertLog::with_max_entries(config.max_alert_entries));
        Self {
            zones: RwLock::new(zones),
            scorer,
            config,
            buffers: RwLock::new(HashMap::new()),
            alert_log,
            sink,
        }
    }

    /// Monitor preloaded with the Rajasthan pilot zones and areas.
    #[must_use]
    pub fn seeded(config: MonitorConfig, sink: Arc<dyn AlertSink>) -> Self {
        Self::new(
            ZoneStore::with_seed_zones(),
            roamguard_risk::areas::seed_areas(),
            config,
            sink,
        )
    }

    /// Assesses `point` for `user_id` at the instant `at`.
    ///
    /// Area scoring runs first; a zone breach then floors the score at
    /// twice the zone's risk level and prepends its guidance, and any
    /// non-breached zone closer than the approach threshold adds a
    /// warning. A breach also emits a `red_zone_breach` alert.
    #[must_use]
    pub fn check_location(
        &self,
        user_id: &str,
        point: Coordinate,
        at: DateTime<Utc>,
    ) -> RiskAssessment {
        let area = self.scorer.score(point, at);
        let mut score = area.overall_risk_score;
        let mut alerts = area.alerts;
        let mut recommendations = area.recommendations;

        let (breach, nearby) = {
            let zones = self.zones.read().unwrap_or_else(PoisonError::into_inner);
            (
                zones.breach(point).cloned(),
                zones.nearby(point, self.config.nearby_radius_km),
            )
        };

        let mut zone_breach = None;
        if let Some(zone) = breach {
            score = score.max(BREACH_FLOOR_PER_LEVEL * f64::from(zone.risk_level));
            alerts.insert(0, format!("You are in a restricted {} zone", zone.zone_type));
            recommendations.insert(
                0,
                "Exit the area immediately and contact authorities".to_string(),
            );
            log::warn!(
                "User {user_id} breached {} (risk level {})",
                zone.name,
                zone.risk_level
            );
            self.emit(&zone_breach_alert(user_id, &zone, at));
            zone_breach = Some(BreachedZone {
                zone_id: zone.id,
                name: zone.name,
                zone_type: zone.zone_type,
                risk_level: zone.risk_level,
            });
        }

        let mut nearby_zones = Vec::with_capacity(nearby.len());
        let mut approach_warned = false;
        for entry in nearby {
            let breached = zone_breach
                .as_ref()
                .is_some_and(|b| b.zone_id == entry.zone.id);
            if !breached && entry.distance_km < self.config.close_approach_km {
                alerts.push(format!(
                    "Warning: {} is {:.1}km away",
                    entry.zone.name, entry.distance_km
                ));
                if !approach_warned {
                    recommendations.push("Avoid moving towards the restricted area".to_string());
                    approach_warned = true;
                }
            }
            nearby_zones.push(ZoneProximity {
                zone_id: entry.zone.id,
                name: entry.zone.name,
                zone_type: entry.zone.zone_type,
                risk_level: entry.zone.risk_level,
                distance_km: entry.distance_km,
            });
        }

        recommendations.truncate(MAX_RECOMMENDATIONS);
        let score = score.clamp(0.0, MAX_SCORE);

        RiskAssessment {
            coordinate: point,
            timestamp: at,
            overall_risk_score: score,
            risk_level: RiskLevel::from_score(score),
            is_safe: is_safe_score(score),
            zone_breach,
            nearby_zones,
            nearest_area: area.nearest_area,
            risk_breakdown: area.risk_breakdown,
            recommendations,
            alerts,
        }
    }

    /// Ingests a sensor batch and runs every applicable detector over the
    /// user's buffered history. Returns the alerts raised by this batch,
    /// already delivered to the sink and recorded in the log.
    ///
    /// A failing detector is logged and skipped; the remaining detectors
    /// still run. Distress analysis is skipped at the `low` processing
    /// level. An empty batch is a no-op.
    pub fn process_sensor_batch(&self, batch: &SensorBatch) -> Vec<Alert> {
        let Some(at) = batch_latest_timestamp(batch) else {
            log::debug!("Empty batch from {}; nothing to process", batch.user_id);
            return Vec::new();
        };

        let mut alerts = Vec::new();
        let buffer = self.buffer_for(&batch.user_id, at);
        {
            let mut guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
            guard.ingest(
                &batch.sensor_samples,
                &batch.location_samples,
                &self.config.buffer,
            );

            match detect_fall(
                &batch.user_id,
                guard.sensor_samples(),
                &self.config.detectors.fall,
            ) {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => {}
                Err(err) => log::error!("Fall detection failed for {}: {err}", batch.user_id),
            }

            match detect_crash(
                &batch.user_id,
                guard.location_samples(),
                guard.sensor_samples(),
                &self.config.detectors.crash,
            ) {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => {}
                Err(err) => log::error!("Crash detection failed for {}: {err}", batch.user_id),
            }

            if batch.processing_level.runs_distress() {
                match detect_distress(
                    &batch.user_id,
                    guard.location_samples(),
                    guard.sensor_samples(),
                    &self.config.detectors.distress,
                ) {
                    Ok(Some(alert)) => alerts.push(alert),
                    Ok(None) => {}
                    Err(err) => {
                        log::error!("Distress detection failed for {}: {err}", batch.user_id);
                    }
                }
            } else {
                log::debug!(
                    "Skipping distress analysis for {} at low processing level",
                    batch.user_id
                );
            }
        }

        if let Some(sample) = batch.location_samples.last() {
            let zones = self.zones.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(zone) = zones.breach(sample.coordinate) {
                alerts.push(zone_breach_alert(&batch.user_id, zone, sample.timestamp));
            }
        }

        for alert in &alerts {
            self.emit(alert);
        }
        alerts
    }

    /// Emits a `battery_critical` alert when `battery_percent` is at or
    /// below the configured threshold. Non-finite readings are ignored.
    pub fn check_device_status(
        &self,
        user_id: &str,
        battery_percent: f64,
        at: DateTime<Utc>,
    ) -> Option<Alert> {
        if !battery_percent.is_finite() || battery_percent > self.config.battery_critical_percent {
            return None;
        }

        let alert = Alert::new(
            user_id,
            AlertType::BatteryCritical,
            AlertPriority::High,
            1.0,
            format!("Battery critically low: {battery_percent:.0}%"),
            at,
            AlertDetails::Battery {
                level_percent: battery_percent,
            },
        );
        self.emit(&alert);
        Some(alert)
    }

    // ── Sessions ────────────────────────────────────────────────────────────

    /// Registers a session for `user_id`, allocating an empty buffer.
    /// Starting an already-active session keeps the existing buffer.
    pub fn session_start(&self, user_id: &str, at: DateTime<Utc>) {
        let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
        buffers.entry(user_id.to_string()).or_insert_with(|| {
            log::info!("Session started for {user_id}");
            Arc::new(Mutex::new(UserBuffer::new(at)))
        });
    }

    /// Drops the user's session and buffered samples. Returns `false` when
    /// no session was active.
    pub fn session_end(&self, user_id: &str) -> bool {
        let removed = self
            .buffers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .is_some();
        if removed {
            log::info!("Session ended for {user_id}");
        }
        removed
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.buffers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Evicts every session idle past the stale threshold, emitting a
    /// `network_loss` alert per evicted user. `now` is supplied by the
    /// caller so sweeps stay deterministic under replay.
    pub fn evict_inactive(&self, now: DateTime<Utc>) -> Vec<Alert> {
        let threshold = Duration::minutes(i64::from(self.config.stale_session_minutes));
        let stale: Vec<(String, DateTime<Utc>)> = {
            let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
            buffers
                .iter()
                .filter_map(|(user, buffer)| {
                    let last = buffer
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .last_activity();
                    (now - last > threshold).then(|| (user.clone(), last))
                })
                .collect()
        };
        if stale.is_empty() {
            return Vec::new();
        }

        let mut evicted = Vec::new();
        {
            let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
            for (user, last) in stale {
                // A batch may have landed between the scan and this lock.
                let still_stale = buffers.get(&user).is_some_and(|buffer| {
                    buffer
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .last_activity()
                        == last
                });
                if still_stale {
                    buffers.remove(&user);
                    evicted.push((user, last));
                }
            }
        }

        evicted
            .into_iter()
            .map(|(user, last)| {
                let minutes = (now - last).num_minutes();
                log::warn!("Evicting stale session for {user}: no contact for {minutes} minutes");
                let alert = Alert::new(
                    user,
                    AlertType::NetworkLoss,
                    AlertPriority::Medium,
                    1.0,
                    format!("Network contact lost; last sample {minutes} minutes ago"),
                    now,
                    AlertDetails::Network {
                        minutes_since_contact: minutes,
                    },
                );
                self.emit(&alert);
                alert
            })
            .collect()
    }

    // ── Alerts ──────────────────────────────────────────────────────────────

    /// Most recent alerts for one user, newest first.
    #[must_use]
    pub fn recent_alerts(&self, user_id: &str, limit: usize) -> Vec<Alert> {
        self.alert_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recent_for_user(user_id, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Marks an alert acknowledged. Returns `false` for an unknown id.
    pub fn acknowledge_alert(&self, alert_id: &str) -> bool {
        self.alert_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .acknowledge(alert_id)
    }

    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.alert_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // ── Zones and areas ─────────────────────────────────────────────────────

    #[must_use]
    pub fn zones_snapshot(&self) -> Vec<RedZone> {
        self.zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .zones()
            .to_vec()
    }

    /// Registers a new restricted zone and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Zone`] when the definition is rejected.
    pub fn add_zone(&self, definition: ZoneDefinition) -> Result<u64, MonitorError> {
        let id = self
            .zones
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(definition)?;
        log::info!("Registered zone {id}");
        Ok(id)
    }

    /// Removes a zone. Returns `false` when the id is unknown.
    pub fn remove_zone(&self, zone_id: u64) -> bool {
        let removed = self
            .zones
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(zone_id);
        if removed {
            log::info!("Removed zone {zone_id}");
        }
        removed
    }

    #[must_use]
    pub fn areas(&self) -> &[TouristArea] {
        self.scorer.areas()
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Buffered `(sensor, location)` sample counts for one user, or `None`
    /// when no session exists.
    #[must_use]
    pub fn buffered_counts(&self, user_id: &str) -> Option<(usize, usize)> {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        let buffer = buffers.get(user_id)?;
        let guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        Some((guard.sensor_samples().len(), guard.location_samples().len()))
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn buffer_for(&self, user_id: &str, at: DateTime<Utc>) -> Arc<Mutex<UserBuffer>> {
        {
            let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(buffer) = buffers.get(user_id) {
                return Arc::clone(buffer);
            }
        }

        let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            buffers
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(UserBuffer::new(at)))),
        )
    }

    fn emit(&self, alert: &Alert) {
        self.sink.deliver(alert);
        self.alert_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(alert.clone());
    }
}

fn zone_breach_alert(user_id: &str, zone: &RedZone, at: DateTime<Utc>) -> Alert {
    Alert::new(
        user_id,
        AlertType::RedZoneBreach,
        AlertPriority::High,
        1.0,
        format!("Red zone breach: {}", zone.name),
        at,
        AlertDetails::ZoneBreach {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            zone_type: zone.zone_type.to_string(),
            risk_level: zone.risk_level,
        },
    )
}

fn batch_latest_timestamp(batch: &SensorBatch) -> Option<DateTime<Utc>> {
    let sensor = batch.sensor_samples.last().map(|s| s.timestamp);
    let location = batch.location_samples.last().map(|s| s.timestamp);
    [sensor, location].into_iter().flatten().max()
}
