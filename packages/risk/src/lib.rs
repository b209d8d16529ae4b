#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Composite risk scoring for tourist locations.
//!
//! [`AreaRiskScorer`] grades a coordinate against a table of known tourist
//! areas. The nearest area contributes crime density, incident history,
//! crowd pressure, and police presence; that contribution is faded with
//! distance so the table's influence decays to a neutral score in
//! uncovered terrain. A time-of-day adjustment is applied after blending,
//! and the final score is clamped to the `0..=10` scale.

pub mod areas;

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike as _, Utc};
use roamguard_geo::{Coordinate, distance_km};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Upper end of the risk scale.
pub const MAX_SCORE: f64 = 10.0;
/// Score at or below which a location is considered safe to visit.
pub const SAFE_SCORE_MAX: f64 = 4.0;
/// Maximum number of recommendations attached to one assessment.
pub const MAX_RECOMMENDATIONS: usize = 8;

const MEDIUM_MIN: f64 = 4.0;
const HIGH_MIN: f64 = 7.0;
const CRITICAL_MIN: f64 = 9.0;

const NIGHT_START_HOUR: u32 = 22;
const NIGHT_END_HOUR: u32 = 5;
const EVENING_START_HOUR: u32 = 18;

const CRIME_DENSITY_DIVISOR: f64 = 100.0;
const CRIME_DENSITY_CAP: f64 = 3.0;
const SAFETY_DEFICIT_WEIGHT: f64 = 0.4;
const INCIDENT_WEIGHT: f64 = 0.05;
const INCIDENT_CAP: f64 = 1.5;

// ── Models ──────────────────────────────────────────────────────────────────

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
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Maps a `0..=10` score onto its band: `[0, 4)` low, `[4, 7)` medium,
    /// `[7, 9)` high, `[9, 10]` critical.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= CRITICAL_MIN {
            Self::Critical
        } else if score >= HIGH_MIN {
            Self::High
        } else if score >= MEDIUM_MIN {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Whether a score falls inside the safe band.
#[must_use]
pub fn is_safe_score(score: f64) -> bool {
    score <= SAFE_SCORE_MAX
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
pub enum PolicePresence {
    Low,
    Moderate,
    High,
}

impl PolicePresence {
    /// Additive score adjustment. Visible policing lowers risk; a thin
    /// presence raises it slightly.
    #[must_use]
    pub const fn risk_adjustment(self) -> f64 {
        match self {
            Self::Low => 0.2,
            Self::Moderate => -0.4,
            Self::High => -1.0,
        }
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
pub enum AreaCategory {
    Heritage,
    Market,
    Transport,
    Religious,
    Nature,
}

/// A tourist area with the observations that feed its risk component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouristArea {
    pub name: String,
    pub coordinate: Coordinate,
    pub category: AreaCategory,
    pub daily_visitors: u32,
    /// Subjective safety grade on a `0..=10` scale, 10 being safest.
    pub safety_rating: f64,
    pub police_presence: PolicePresence,
    /// City-level reported crime rate per 100 000 residents.
    pub crime_rate_per_100k: f64,
    /// Incidents recorded in or near the area over the trailing year.
    pub crime_incidents: u32,
    pub risk_factors: Vec<String>,
}

/// City-level crime statistics, kept alongside the area table for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCrimeStats {
    pub city: String,
    pub reported_incidents: u32,
    pub rate_per_100k: f64,
}

/// The area a query point resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestArea {
    pub name: String,
    pub category: AreaCategory,
    pub distance_km: f64,
}

/// Area-level risk verdict for one coordinate at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRisk {
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    pub is_safe: bool,
    pub nearest_area: Option<NearestArea>,
    /// Named factor contributions, in stable key order.
    pub risk_breakdown: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
}

/// Tunable scoring policy. Factor weights are fixed; the blend and
/// time-of-day magnitudes are deployment knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score reported where no area intelligence applies.
    pub neutral_score: f64,
    /// Distance at which an area's contribution has fully faded.
    pub influence_radius_km: f64,
    pub evening_adjustment: f64,
    pub night_adjustment: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            neutral_score: 5.0,
            influence_radius_km: 25.0,
            evening_adjustment: 0.7,
            night_adjustment: 1.5,
        }
    }
}

// ── Scorer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AreaRiskScorer {
    areas: Vec<TouristArea>,
    config: RiskConfig,
}

impl AreaRiskScorer {
    #[must_use]
    pub fn new(areas: Vec<TouristArea>) -> Self {
        Self::with_config(areas, RiskConfig::default())
    }

    #[must_use]
    pub const fn with_config(areas: Vec<TouristArea>, config: RiskConfig) -> Self {
        Self { areas, config }
    }

    /// Scorer preloaded with the Rajasthan pilot table.
    #[must_use]
    pub fn with_seed_areas() -> Self {
        Self::new(areas::seed_areas())
    }

    #[must_use]
    pub fn areas(&self) -> &[TouristArea] {
        &self.areas
    }

    /// Nearest known area and its great-circle distance from `point`.
    #[must_use]
    pub fn nearest(&self, point: Coordinate) -> Option<(&TouristArea, f64)> {
        self.areas
            .iter()
            .map(|area| (area, distance_km(point, area.coordinate)))
            .filter(|(_, distance)| distance.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Scores `point` at the instant `at`.
    ///
    /// The nearest area's factors are summed into a raw component, blended
    /// towards the neutral score by proximity weight
    /// `1 - distance / influence_radius` (clamped to `0..=1`), adjusted for
    /// the hour of day, and clamped to `0..=10`. Identical inputs always
    /// produce an identical assessment. An invalid coordinate or an empty
    /// area table yields the neutral assessment rather than an error.
    #[must_use]
    pub fn score(&self, point: Coordinate, at: DateTime<Utc>) -> AreaRisk {
        if !point.is_valid() {
            log::warn!("risk query for invalid coordinate {point:?}; returning neutral score");
            return self.neutral(at, None);
        }

        let Some((area, distance)) = self.nearest(point) else {
            return self.neutral(at, None);
        };

        let nearest = NearestArea {
            name: area.name.clone(),
            category: area.category,
            distance_km: distance,
        };
        let weight = (1.0 - distance / self.config.influence_radius_km).clamp(0.0, 1.0);
        if weight <= 0.0 {
            return self.neutral(at, Some(nearest));
        }

        let crime_density = (area.crime_rate_per_100k / CRIME_DENSITY_DIVISOR).min(CRIME_DENSITY_CAP);
        let safety_deficit = (MAX_SCORE - area.safety_rating).max(0.0) * SAFETY_DEFICIT_WEIGHT;
        let incident_history = (f64::from(area.crime_incidents) * INCIDENT_WEIGHT).min(INCIDENT_CAP);
        let crowd_analysis = crowd_factor(area.daily_visitors);
        let police_presence = area.police_presence.risk_adjustment();

        let component = (crime_density + safety_deficit + incident_history + crowd_analysis
            + police_presence)
            .max(0.0);
        let hour = at.hour();
        let time_of_day = self.time_adjustment(hour);
        let score = ((component - self.config.neutral_score)
            .mul_add(weight, self.config.neutral_score)
            + time_of_day)
            .clamp(0.0, MAX_SCORE);

        let mut risk_breakdown = BTreeMap::new();
        risk_breakdown.insert("crime_density".to_string(), crime_density);
        risk_breakdown.insert("safety_deficit".to_string(), safety_deficit);
        risk_breakdown.insert("incident_history".to_string(), incident_history);
        risk_breakdown.insert("crowd_analysis".to_string(), crowd_analysis);
        risk_breakdown.insert("police_presence".to_string(), police_presence);
        risk_breakdown.insert("proximity_weight".to_string(), weight);
        risk_breakdown.insert("time_of_day".to_string(), time_of_day);

        let night = is_night_hour(hour);
        let recommendations = recommendations_for(
            area,
            crime_density,
            crowd_analysis,
            incident_history,
            night,
            score,
        );

        AreaRisk {
            overall_risk_score: score,
            risk_level: RiskLevel::from_score(score),
            is_safe: is_safe_score(score),
            nearest_area: Some(nearest),
            risk_breakdown,
            recommendations,
            alerts: alerts_for(score, night),
        }
    }

    fn neutral(&self, at: DateTime<Utc>, nearest_area: Option<NearestArea>) -> AreaRisk {
        let time_of_day = self.time_adjustment(at.hour());
        let score = (self.config.neutral_score + time_of_day).clamp(0.0, MAX_SCORE);

        let mut risk_breakdown = BTreeMap::new();
        risk_breakdown.insert("proximity_weight".to_string(), 0.0);
        risk_breakdown.insert("time_of_day".to_string(), time_of_day);

        AreaRisk {
            overall_risk_score: score,
            risk_level: RiskLevel::from_score(score),
            is_safe: is_safe_score(score),
            nearest_area,
            risk_breakdown,
            recommendations: vec![
                "No recorded intelligence for this location; apply standard travel precautions"
                    .to_string(),
            ],
            alerts: Vec::new(),
        }
    }

    fn time_adjustment(&self, hour: u32) -> f64 {
        if is_night_hour(hour) {
            self.config.night_adjustment
        } else if hour >= EVENING_START_HOUR {
            self.config.evening_adjustment
        } else {
            0.0
        }
    }
}

const fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

const fn crowd_factor(daily_visitors: u32) -> f64 {
    if daily_visitors >= 20_000 {
        1.0
    } else if daily_visitors >= 10_000 {
        0.7
    } else if daily_visitors >= 5000 {
        0.4
    } else {
        0.1
    }
}

fn recommendations_for(
    area: &TouristArea,
    crime_density: f64,
    crowd_analysis: f64,
    incident_history: f64,
    night: bool,
    score: f64,
) -> Vec<String> {
    let mut out = Vec::new();

    if night {
        out.push("Avoid poorly lit or deserted streets after dark".to_string());
        out.push("Use registered taxis or hotel transport for night travel".to_string());
    }
    if crime_density >= 2.5 {
        out.push("Carry minimal cash and keep valuables out of sight".to_string());
    }
    if crowd_analysis >= 0.7 {
        out.push("Stay alert for pickpockets in dense crowds".to_string());
    }
    if matches!(area.police_presence, PolicePresence::Low) {
        out.push("Note the nearest police station before exploring".to_string());
    }
    if incident_history >= 1.0 {
        out.push("Check recent local advisories; this area logs frequent incidents".to_string());
    }
    for factor in &area.risk_factors {
        out.push(format!("Known issue at {}: {factor}", area.name));
    }
    if score >= HIGH_MIN {
        out.push("Consider visiting with a group or a licensed guide".to_string());
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}

fn alerts_for(score: f64, night: bool) -> Vec<String> {
    let mut out = Vec::new();

    if score >= CRITICAL_MIN {
        out.push("Critical risk level; avoid this area if at all possible".to_string());
    } else if score >= HIGH_MIN {
        out.push("High risk area; stay alert and keep to busy streets".to_string());
    }
    if night && score >= HIGH_MIN {
        out.push("Elevated night-time risk; postpone non-essential travel".to_string());
    }

    out
}
