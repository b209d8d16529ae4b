#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory registry of geo-fenced restricted areas ("red zones").
//!
//! Zones are polygonal no-go areas with a 1-5 risk level. The store keeps
//! them in insertion order (the documented tie-break for overlapping
//! zones) and maintains an R-tree of bounding-box envelopes so breach
//! queries only ray-cast against plausible candidates.
//!
//! Geometry failures never escape a query: a zone whose geometry cannot
//! be evaluated is skipped with a logged warning, and the caller sees the
//! safe default (not breached / not nearby) instead of an error.

mod load;
mod seed;

use roamguard_geo::Coordinate;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use load::zones_from_geojson;
pub use seed::seed_zones;

/// Default search radius for proximity checks, in kilometers.
pub const NEARBY_RADIUS_KM: f64 = 2.0;

/// Distance below which a nearby zone warrants an explicit warning, in
/// kilometers.
pub const CLOSE_APPROACH_KM: f64 = 1.0;

/// Classification of a restricted zone.
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
pub enum ZoneType {
    /// Military installation or exercise area.
    Military,
    /// Protected wildlife sanctuary with restricted access.
    Wildlife,
    /// Border security corridor.
    Border,
    /// Industrial or mining hazard area.
    Industrial,
    /// Operator-defined zone with no standard classification.
    Custom,
}

/// A registered restricted zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedZone {
    /// Unique, monotonically assigned identifier.
    pub id: u64,
    /// Human-readable zone name.
    pub name: String,
    /// Zone classification.
    pub zone_type: ZoneType,
    /// Boundary vertices, implicitly closed, at least 3.
    pub polygon: Vec<Coordinate>,
    /// Danger rating from 1 (caution) to 5 (severe).
    pub risk_level: u8,
}

impl RedZone {
    /// Arithmetic center of the zone's boundary vertices.
    #[must_use]
    pub fn centroid(&self) -> Option<Coordinate> {
        roamguard_geo::centroid(&self.polygon)
    }
}

/// Zone definition supplied by callers to [`ZoneStore::add`]; the store
/// assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDefinition {
    /// Human-readable zone name.
    pub name: String,
    /// Zone classification.
    pub zone_type: ZoneType,
    /// Boundary vertices, implicitly closed, at least 3.
    pub polygon: Vec<Coordinate>,
    /// Danger rating from 1 (caution) to 5 (severe).
    pub risk_level: u8,
}

/// A zone matched by a proximity query, with its centroid distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyZone {
    /// The matched zone.
    pub zone: RedZone,
    /// Distance from the query point to the zone's centroid, in km.
    pub distance_km: f64,
}

/// Error raised when a zone definition fails validation or parsing.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The polygon does not have enough vertices to enclose an area.
    #[error("Zone polygon must have at least 3 vertices, got {got}")]
    TooFewVertices {
        /// Number of vertices supplied.
        got: usize,
    },
    /// The risk level is outside the 1-5 scale.
    #[error("Zone risk level must be 1-5, got {got}")]
    InvalidRiskLevel {
        /// The rejected risk level.
        got: u8,
    },
    /// A polygon vertex is outside valid geographic ranges.
    #[error("Invalid zone vertex: {0}")]
    Coordinate(#[from] roamguard_geo::InvalidCoordinateError),
    /// The supplied GeoJSON document could not be parsed.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),
    /// The supplied GeoJSON document is not a `FeatureCollection`.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}

/// A zone's bounding box stored in the R-tree for breach pre-filtering.
struct ZoneEnvelope {
    id: u64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn compute_envelope(polygon: &[Coordinate]) -> AABB<[f64; 2]> {
    roamguard_geo::bounding_box(polygon).map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |bbox| AABB::from_corners([bbox.min_lng, bbox.min_lat], [bbox.max_lng, bbox.max_lat]),
    )
}

/// Insertion-ordered registry of red zones with an envelope index.
pub struct ZoneStore {
    zones: Vec<RedZone>,
    index: RTree<ZoneEnvelope>,
    next_id: u64,
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zones: Vec::new(),
            index: RTree::new(),
            next_id: 1,
        }
    }

    /// Creates a store pre-populated with the fixed seed zones.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in seed data is invalid, which a seed-data
    /// unit test rules out.
    #[must_use]
    pub fn with_seed_zones() -> Self {
        let mut store = Self::new();
        for definition in seed::seed_zones() {
            store
                .add(definition)
                .expect("seed zone definitions are valid");
        }
        store
    }

    /// Rebuilds a store from previously exported zones, preserving ids.
    ///
    /// Duplicate ids keep the first occurrence; later duplicates are
    /// dropped with a logged warning.
    #[must_use]
    pub fn from_zones(zones: Vec<RedZone>) -> Self {
        let mut store = Self::new();

        for zone in zones {
            if store.zones.iter().any(|existing| existing.id == zone.id) {
                log::warn!("Skipping duplicate zone id {} ({})", zone.id, zone.name);
                continue;
            }
            if zone.polygon.len() < 3 {
                log::warn!(
                    "Skipping zone {} ({}): degenerate polygon with {} vertices",
                    zone.id,
                    zone.name,
                    zone.polygon.len()
                );
                continue;
            }
            store.next_id = store.next_id.max(zone.id + 1);
            store.index.insert(ZoneEnvelope {
                id: zone.id,
                envelope: compute_envelope(&zone.polygon),
            });
            store.zones.push(zone);
        }

        store
    }

    /// Number of registered zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the store holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// All zones in insertion order.
    #[must_use]
    pub fn zones(&self) -> &[RedZone] {
        &self.zones
    }

    /// Looks up a zone by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&RedZone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Registers a new zone and returns its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon has fewer than 3 vertices, any
    /// vertex is out of range, or the risk level is outside 1-5.
    pub fn add(&mut self, definition: ZoneDefinition) -> Result<u64, ZoneError> {
        if definition.polygon.len() < 3 {
            return Err(ZoneError::TooFewVertices {
                got: definition.polygon.len(),
            });
        }
        if !(1..=5).contains(&definition.risk_level) {
            return Err(ZoneError::InvalidRiskLevel {
                got: definition.risk_level,
            });
        }
        for vertex in &definition.polygon {
            Coordinate::new(vertex.latitude, vertex.longitude)?;
        }

        let id = self.next_id;
        self.next_id += 1;
        log::info!("Registered red zone {id}: {}", definition.name);

        self.index.insert(ZoneEnvelope {
            id,
            envelope: compute_envelope(&definition.polygon),
        });
        self.zones.push(RedZone {
            id,
            name: definition.name,
            zone_type: definition.zone_type,
            polygon: definition.polygon,
            risk_level: definition.risk_level,
        });

        Ok(id)
    }

    /// Removes a zone by id. Removing an absent id is a no-op, so the
    /// operation is idempotent; returns whether a zone was actually
    /// removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.zones.len();
        self.zones.retain(|zone| zone.id != id);
        let removed = self.zones.len() != before;

        if removed {
            // rstar removal needs an equal element; rebuilding the small
            // envelope set is simpler and keeps ids authoritative.
            self.index = RTree::bulk_load(
                self.zones
                    .iter()
                    .map(|zone| ZoneEnvelope {
                        id: zone.id,
                        envelope: compute_envelope(&zone.polygon),
                    })
                    .collect(),
            );
            log::info!("Removed red zone {id}");
        }

        removed
    }

    /// Returns the breached zone for a point, if any.
    ///
    /// Zones are tested in insertion order and the first containing zone
    /// wins; overlapping zones behind it are not consulted. Invalid query
    /// points are logged and report no breach (the safe default for a
    /// query that cannot be evaluated).
    #[must_use]
    pub fn breach(&self, point: Coordinate) -> Option<&RedZone> {
        if !point.is_valid() {
            log::warn!(
                "Breach query with invalid coordinate ({}, {})",
                point.latitude,
                point.longitude
            );
            return None;
        }

        let query = AABB::from_point([point.longitude, point.latitude]);
        let candidates: Vec<u64> = self
            .index
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.id)
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let hit = self.zones.iter().find(|zone| {
            candidates.contains(&zone.id)
                && roamguard_geo::point_in_polygon(point, &zone.polygon)
        });

        if let Some(zone) = hit {
            log::warn!(
                "Red zone breach detected: {} (type {}, risk {})",
                zone.name,
                zone.zone_type,
                zone.risk_level
            );
        }

        hit
    }

    /// Zones whose centroids lie within `radius_km` of the point, sorted
    /// ascending by distance.
    ///
    /// Distance is measured to the centroid rather than the polygon
    /// boundary, a documented approximation that keeps the query cheap.
    /// Zones with unevaluable geometry are skipped with a warning.
    #[must_use]
    pub fn nearby(&self, point: Coordinate, radius_km: f64) -> Vec<NearbyZone> {
        if !point.is_valid() {
            log::warn!(
                "Nearby query with invalid coordinate ({}, {})",
                point.latitude,
                point.longitude
            );
            return Vec::new();
        }

        let mut matches: Vec<NearbyZone> = self
            .zones
            .iter()
            .filter_map(|zone| {
                let Some(centroid) = zone.centroid() else {
                    log::warn!("Zone {} has no computable centroid, skipping", zone.id);
                    return None;
                };
                let distance_km = roamguard_geo::distance_km(point, centroid);
                (distance_km <= radius_km).then(|| NearbyZone {
                    zone: zone.clone(),
                    distance_km,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        matches
    }
}
