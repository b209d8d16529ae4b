#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Safety alert model and delivery plumbing.
//!
//! Detectors and the monitor produce [`Alert`]s; an [`AlertLog`] keeps the
//! in-memory history per deployment, and an [`AlertSink`] carries each alert
//! out of the engine (to logs, a channel consumer, or nowhere). Emission
//! never blocks detection: the channel sink hands off on an unbounded
//! channel and drops with a warning once the consumer is gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::sync::mpsc;
use uuid::Uuid;

// ── Model ───────────────────────────────────────────────────────────────────

#[derive(
    Debug,
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
pub enum AlertType {
    FallDetected,
    CrashDetected,
    DistressDetected,
    RedZoneBreach,
    BatteryCritical,
    NetworkLoss,
}

/// Ordered by urgency: `Low < Medium < High < Critical`.
#[derive(
    Debug,
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
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    /// Whether responders should be paged rather than notified.
    #[must_use]
    pub const fn is_urgent(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(
    Debug,
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
pub enum DetectionMethod {
    RuleBased,
}

/// Structured payload attached to an alert, shaped by what raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AlertDetails {
    Fall {
        max_impact_g: f64,
        min_freefall_g: f64,
    },
    Crash {
        max_g_force: f64,
        deceleration_ms2: f64,
        speed_before_kmh: f64,
        speed_after_kmh: f64,
    },
    Distress {
        indicators: Vec<String>,
        combined_confidence: f64,
    },
    ZoneBreach {
        zone_id: u64,
        zone_name: String,
        zone_type: String,
        risk_level: u8,
    },
    Battery {
        level_percent: f64,
    },
    Network {
        minutes_since_contact: i64,
    },
}

/// One safety alert raised for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    /// Detector confidence in `0..=1`. Geometric breaches are certain (1.0).
    pub confidence: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub detection_method: DetectionMethod,
    pub details: AlertDetails,
    /// Distress patterns are circumstantial and need human confirmation
    /// before escalation; other alert kinds dispatch directly.
    pub requires_verification: bool,
    pub acknowledged: bool,
}

impl Alert {
    /// Builds an alert with a fresh v4 id, unacknowledged, detection method
    /// `rule_based`.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        alert_type: AlertType,
        priority: AlertPriority,
        confidence: f64,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        details: AlertDetails,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            alert_type,
            priority,
            confidence,
            message: message.into(),
            timestamp,
            detection_method: DetectionMethod::RuleBased,
            details,
            requires_verification: matches!(alert_type, AlertType::DistressDetected),
            acknowledged: false,
        }
    }
}

// ── Log ─────────────────────────────────────────────────────────────────────

/// In-memory alert history. Holds at most `max_entries` alerts; recording
/// past the cap drops the oldest first, acknowledged or not.
#[derive(Debug)]
pub struct AlertLog {
    alerts: Vec<Alert>,
    max_entries: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertLog {
    pub const DEFAULT_MAX_ENTRIES: usize = 500;

    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_entries(Self::DEFAULT_MAX_ENTRIES)
    }

    #[must_use]
    pub const fn with_max_entries(max_entries: usize) -> Self {
        Self {
            alerts: Vec::new(),
            max_entries,
        }
    }

    pub fn record(&mut self, alert: Alert) {
        if alert.priority.is_urgent() {
            log::warn!(
                "[{}] {} alert for {}: {}",
                alert.priority,
                alert.alert_type,
                alert.user_id,
                alert.message
            );
        } else {
            log::info!(
                "[{}] {} alert for {}: {}",
                alert.priority,
                alert.alert_type,
                alert.user_id,
                alert.message
            );
        }
        self.alerts.push(alert);
        if self.alerts.len() > self.max_entries {
            let excess = self.alerts.len() - self.max_entries;
            self.alerts.drain(..excess);
        }
    }

    /// The user's alerts, newest first, at most `limit`.
    #[must_use]
    pub fn recent_for_user(&self, user_id: &str, limit: usize) -> Vec<&Alert> {
        self.alerts
            .iter()
            .rev()
            .filter(|alert| alert.user_id == user_id)
            .take(limit)
            .collect()
    }

    /// Marks the alert acknowledged. Returns `false` when the id is unknown.
    pub fn acknowledge(&mut self, alert_id: &str) -> bool {
        self.alerts
            .iter_mut()
            .find(|alert| alert.id == alert_id)
            .is_some_and(|alert| {
                alert.acknowledged = true;
                true
            })
    }

    #[must_use]
    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

// ── Sinks ───────────────────────────────────────────────────────────────────

/// Outbound alert delivery. Implementations must not block; detection runs
/// on the caller's thread.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: &Alert);
}

/// Discards every alert. Stand-in where delivery is wired up elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AlertSink for NullSink {
    fn deliver(&self, _alert: &Alert) {}
}

/// Writes each alert to the log, level picked by priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&self, alert: &Alert) {
        if alert.priority.is_urgent() {
            log::warn!("delivering {} alert {} for {}", alert.alert_type, alert.id, alert.user_id);
        } else {
            log::info!("delivering {} alert {} for {}", alert.alert_type, alert.id, alert.user_id);
        }
    }
}

/// Hands alerts to an async consumer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Alert>,
}

impl ChannelSink {
    /// The sink and the receiving half for the consumer task.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertSink for ChannelSink {
    fn deliver(&self, alert: &Alert) {
        if self.tx.send(alert.clone()).is_err() {
            log::warn!("alert channel closed; dropping alert {}", alert.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn sample_alert(user_id: &str) -> Alert {
        Alert::new(
            user_id,
            AlertType::FallDetected,
            AlertPriority::Critical,
            0.75,
            "Fall detected",
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 15, 0).unwrap(),
            AlertDetails::Fall {
                max_impact_g: 24.3,
                min_freefall_g: 1.2,
            },
        )
    }

    #[test]
    fn new_alert_gets_a_v4_id_and_starts_unacknowledged() {
        let alert = sample_alert("tourist-1");

        assert_eq!(alert.id.len(), 36);
        assert_eq!(alert.id.matches('-').count(), 4);
        assert!(!alert.acknowledged);
        assert_eq!(alert.detection_method, DetectionMethod::RuleBased);
    }

    #[test]
    fn only_distress_requires_verification() {
        let fall = sample_alert("tourist-1");
        let distress = Alert::new(
            "tourist-1",
            AlertType::DistressDetected,
            AlertPriority::Medium,
            0.5,
            "Possible distress",
            fall.timestamp,
            AlertDetails::Distress {
                indicators: vec!["prolonged_inactivity".to_string()],
                combined_confidence: 0.5,
            },
        );

        assert!(!fall.requires_verification);
        assert!(distress.requires_verification);
    }

    #[test]
    fn recent_for_user_is_newest_first_and_scoped() {
        let mut alert_log = AlertLog::new();
        for i in 0..5 {
            let mut alert = sample_alert("tourist-1");
            alert.message = format!("alert {i}");
            alert_log.record(alert);
        }
        alert_log.record(sample_alert("tourist-2"));

        let recent = alert_log.recent_for_user("tourist-1", 3);

        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "alert 4");
        assert_eq!(recent[2].message, "alert 2");
        assert!(recent.iter().all(|alert| alert.user_id == "tourist-1"));
    }

    #[test]
    fn log_drops_oldest_entries_past_the_cap() {
        let mut alert_log = AlertLog::with_max_entries(3);
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut alert = sample_alert("tourist-1");
            alert.message = format!("alert {i}");
            ids.push(alert.id.clone());
            alert_log.record(alert);
        }

        assert_eq!(alert_log.len(), 3);
        assert_eq!(alert_log.all()[0].message, "alert 2");
        assert!(!alert_log.acknowledge(&ids[0]));
        assert!(alert_log.acknowledge(&ids[4]));
    }

    #[test]
    fn acknowledge_flips_the_flag_once_found() {
        let mut alert_log = AlertLog::new();
        let alert = sample_alert("tourist-1");
        let id = alert.id.clone();
        alert_log.record(alert);

        assert!(alert_log.acknowledge(&id));
        assert!(alert_log.all()[0].acknowledged);
        assert!(!alert_log.acknowledge("no-such-id"));
    }

    #[test]
    fn channel_sink_hands_alerts_to_the_receiver() {
        let (sink, mut rx) = ChannelSink::new();
        let alert = sample_alert("tourist-1");

        sink.deliver(&alert);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id, alert.id);
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        sink.deliver(&sample_alert("tourist-1"));
    }

    #[test]
    fn details_serialize_with_a_kind_tag() {
        let alert = sample_alert("tourist-1");

        let value = serde_json::to_value(&alert).unwrap();

        assert_eq!(value["details"]["kind"], "fall");
        assert!(value["details"]["maxImpactG"].is_number());
        assert_eq!(value["alertType"], "fall_detected");
    }

    #[test]
    fn priorities_order_by_urgency() {
        assert!(AlertPriority::Critical > AlertPriority::High);
        assert!(AlertPriority::High > AlertPriority::Medium);
        assert!(AlertPriority::Medium > AlertPriority::Low);
        assert!(AlertPriority::High.is_urgent());
        assert!(!AlertPriority::Medium.is_urgent());
    }
}
