//! GeoJSON import for operator-supplied zone sets.
//!
//! Accepts a `FeatureCollection` of `Polygon` features carrying `name`,
//! `zoneType`, and `riskLevel` properties. Malformed features are skipped
//! with a logged warning rather than failing the whole import, so one bad
//! zone in a config file cannot take the registry down.

use geojson::{Feature, GeoJson};
use roamguard_geo::Coordinate;

use crate::{ZoneDefinition, ZoneError, ZoneType};

/// Parses a GeoJSON `FeatureCollection` into zone definitions.
///
/// Features that are not polygons, lack a `name` property, or carry
/// out-of-range values are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the document is not parseable GeoJSON or is not a
/// `FeatureCollection`.
pub fn zones_from_geojson(geojson_str: &str) -> Result<Vec<ZoneDefinition>, ZoneError> {
    let geojson: GeoJson = geojson_str.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(ZoneError::NotFeatureCollection);
    };

    let mut definitions = Vec::new();
    for (index, feature) in collection.features.into_iter().enumerate() {
        match zone_from_feature(feature) {
            Some(definition) => definitions.push(definition),
            None => log::warn!("Skipping unusable zone feature at index {index}"),
        }
    }

    Ok(definitions)
}

fn zone_from_feature(feature: Feature) -> Option<ZoneDefinition> {
    let geometry = feature.geometry?;
    let geo_geometry: geo::Geometry<f64> = geometry.try_into().ok()?;
    let geo::Geometry::Polygon(polygon) = geo_geometry else {
        return None;
    };

    let mut vertices: Vec<Coordinate> = polygon
        .exterior()
        .coords()
        .map(|coord| Coordinate {
            latitude: coord.y,
            longitude: coord.x,
        })
        .collect();

    // GeoJSON rings repeat the first vertex at the end; our polygons are
    // implicitly closed.
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 {
        return None;
    }

    let properties = feature.properties?;
    let name = properties.get("name")?.as_str()?.to_string();
    let zone_type = properties
        .get("zoneType")
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(ZoneType::Custom);
    let risk_level = properties
        .get("riskLevel")
        .and_then(serde_json::Value::as_u64)
        .and_then(|raw| u8::try_from(raw).ok())
        .filter(|level| (1..=5).contains(level))
        .unwrap_or(3);

    Some(ZoneDefinition {
        name,
        zone_type,
        polygon: vertices,
        risk_level,
    })
}
