#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geographic primitives shared by every roamguard component.
//!
//! All geometry in the system goes through this crate: great-circle
//! distance, initial bearing, ray-cast polygon containment, and the
//! bounding-box helpers the zone index is built on. The polygon math uses
//! flat-earth approximations that are accurate at tourist-zone scale
//! (a few km across) and degrade over continental distances.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate kilometers per degree of latitude (and of longitude at the
/// equator). Used for degree↔km conversions at small scales.
pub const KM_PER_DEGREE: f64 = 111.32;

/// A validated geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in decimal degrees, range [-90, 90].
    pub latitude: f64,
    /// Longitude in decimal degrees, range [-180, 180].
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate after range-checking both components.
    ///
    /// # Errors
    ///
    /// Returns an error if latitude is outside [-90, 90] or longitude is
    /// outside [-180, 180]. NaN fails both checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(InvalidCoordinateError {
                latitude,
                longitude,
            })
        }
    }

    /// Returns whether both components are within valid geographic ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Error returned when a coordinate falls outside valid geographic ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinateError {
    /// The rejected latitude.
    pub latitude: f64,
    /// The rejected longitude.
    pub longitude: f64,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinate ({}, {}): latitude must be in [-90, 90] and longitude in [-180, 180]",
            self.latitude, self.longitude
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// Axis-aligned bounding box over geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Eastern edge.
    pub max_lng: f64,
}

impl BoundingBox {
    /// Returns whether the point lies inside this box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    /// Expands the box outward by roughly `km` kilometers on every side.
    ///
    /// Latitude grows by a fixed `km / 111.32` degrees; longitude scaling
    /// depends on the box's mean latitude (`km / (111.32 * cos(avg_lat))`),
    /// so the expansion degenerates near the poles.
    #[must_use]
    pub fn expanded(&self, km: f64) -> Self {
        let lat_expansion = km / KM_PER_DEGREE;
        let avg_lat = f64::midpoint(self.min_lat, self.max_lat);
        let lng_expansion = km / (KM_PER_DEGREE * avg_lat.to_radians().cos());

        Self {
            min_lat: self.min_lat - lat_expansion,
            max_lat: self.max_lat + lat_expansion,
            min_lng: self.min_lng - lng_expansion,
            max_lng: self.max_lng + lng_expansion,
        }
    }
}

/// Great-circle distance between two points in kilometers (Haversine).
///
/// Symmetric in its arguments and zero for identical points.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360).
///
/// Degenerate inputs (identical or antipodal points) resolve to the
/// formula's natural output rather than erroring.
#[must_use]
pub fn bearing_deg(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Ray-cast point-in-polygon test.
///
/// The polygon is implicitly closed (last vertex connects back to the
/// first) and need not be convex. Fewer than 3 vertices always returns
/// `false`. Points exactly on an edge are implementation-defined; callers
/// must not rely on edge-exact inclusion either way.
#[must_use]
pub fn point_in_polygon(point: Coordinate, polygon: &[Coordinate]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    // Horizontal ray cast eastward at the point's latitude, counting edge
    // crossings (even-odd rule). x is longitude, y is latitude.
    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut p1 = polygon[0];

    for i in 1..=polygon.len() {
        let p2 = polygon[i % polygon.len()];
        let (p1x, p1y) = (p1.longitude, p1.latitude);
        let (p2x, p2y) = (p2.longitude, p2.latitude);

        if y > p1y.min(p2y)
            && y <= p1y.max(p2y)
            && x <= p1x.max(p2x)
            && (p1y - p2y).abs() > f64::EPSILON
        {
            let x_intersect = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
            if (p1x - p2x).abs() < f64::EPSILON || x <= x_intersect {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

/// Arithmetic mean of the polygon's vertices.
///
/// Not a true area centroid, but adequate for the small zones this system
/// manages. Returns `None` for an empty vertex list.
#[must_use]
pub fn centroid(polygon: &[Coordinate]) -> Option<Coordinate> {
    if polygon.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = polygon.len() as f64;
    let lat_sum: f64 = polygon.iter().map(|p| p.latitude).sum();
    let lng_sum: f64 = polygon.iter().map(|p| p.longitude).sum();

    Some(Coordinate {
        latitude: lat_sum / n,
        longitude: lng_sum / n,
    })
}

/// Polygon area in km² via the shoelace formula over degree coordinates,
/// converted with a uniform 111.32 km/degree factor.
///
/// Accurate only at tourist-zone scale; returns 0.0 for fewer than 3
/// vertices.
#[must_use]
pub fn polygon_area_km2(polygon: &[Coordinate]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let mut doubled = 0.0;
    for i in 0..polygon.len() {
        let j = (i + 1) % polygon.len();
        doubled += polygon[i].longitude * polygon[j].latitude;
        doubled -= polygon[j].longitude * polygon[i].latitude;
    }

    (doubled.abs() / 2.0) * KM_PER_DEGREE * KM_PER_DEGREE
}

/// Smallest bounding box containing all the given points, or `None` for an
/// empty slice.
#[must_use]
pub fn bounding_box(points: &[Coordinate]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bbox = BoundingBox {
        min_lat: first.latitude,
        max_lat: first.latitude,
        min_lng: first.longitude,
        max_lng: first.longitude,
    };

    for point in &points[1..] {
        bbox.min_lat = bbox.min_lat.min(point.latitude);
        bbox.max_lat = bbox.max_lat.max(point.latitude);
        bbox.min_lng = bbox.min_lng.min(point.longitude);
        bbox.max_lng = bbox.max_lng.max(point.longitude);
    }

    Some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate {
            latitude: lat,
            longitude: lng,
        }
    }

    fn square() -> Vec<Coordinate> {
        vec![
            coord(26.90, 75.78),
            coord(26.92, 75.78),
            coord(26.92, 75.80),
            coord(26.90, 75.80),
        ]
    }

    #[test]
    fn distance_identical_points_is_zero() {
        let jaipur = coord(26.9124, 75.7873);
        assert!(distance_km(jaipur, jaipur).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let jaipur = coord(26.9124, 75.7873);
        let jodhpur = coord(26.2389, 73.0243);
        let there = distance_km(jaipur, jodhpur);
        let back = distance_km(jodhpur, jaipur);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn distance_jaipur_to_jodhpur() {
        let jaipur = coord(26.9124, 75.7873);
        let jodhpur = coord(26.2389, 73.0243);
        let d = distance_km(jaipur, jodhpur);
        assert!((d - 284.8).abs() < 2.0, "got {d} km");
    }

    #[test]
    fn bearing_due_north() {
        let b = bearing_deg(coord(26.0, 75.0), coord(27.0, 75.0));
        assert!(b.abs() < 1e-6, "got {b}");
    }

    #[test]
    fn bearing_roughly_east() {
        let b = bearing_deg(coord(26.0, 75.0), coord(26.0, 76.0));
        assert!((89.0..90.0).contains(&b), "got {b}");
    }

    #[test]
    fn bearing_always_in_range() {
        let points = [
            (coord(26.9, 75.8), coord(24.5, 73.7)),
            (coord(-33.9, 151.2), coord(51.5, -0.1)),
            (coord(0.0, 0.0), coord(0.0, 0.0)),
            (coord(10.0, 20.0), coord(-10.0, -160.0)),
        ];
        for (a, b) in points {
            let bearing = bearing_deg(a, b);
            assert!((0.0..360.0).contains(&bearing), "got {bearing}");
        }
    }

    #[test]
    fn point_in_polygon_centroid_of_square_is_inside() {
        let zone = square();
        let center = centroid(&zone).unwrap();
        assert!(point_in_polygon(center, &zone));
    }

    #[test]
    fn point_in_polygon_far_point_is_outside() {
        // ~32 km north of the square's bounding box.
        assert!(!point_in_polygon(coord(27.2, 75.79), &square()));
    }

    #[test]
    fn point_in_polygon_rejects_degenerate_polygons() {
        let p = coord(26.91, 75.79);
        assert!(!point_in_polygon(p, &[]));
        assert!(!point_in_polygon(p, &[coord(26.90, 75.78)]));
        assert!(!point_in_polygon(
            p,
            &[coord(26.90, 75.78), coord(26.92, 75.80)]
        ));
    }

    #[test]
    fn point_in_polygon_concave_shape() {
        // An L-shape: the notch at (26.915, 75.795) is outside even though
        // it sits inside the outer bounding box.
        let l_shape = vec![
            coord(26.90, 75.78),
            coord(26.92, 75.78),
            coord(26.92, 75.79),
            coord(26.91, 75.79),
            coord(26.91, 75.80),
            coord(26.90, 75.80),
        ];
        assert!(point_in_polygon(coord(26.905, 75.795), &l_shape));
        assert!(!point_in_polygon(coord(26.915, 75.795), &l_shape));
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let center = centroid(&square()).unwrap();
        assert!((center.latitude - 26.91).abs() < 1e-9);
        assert!((center.longitude - 75.79).abs() < 1e-9);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn polygon_area_of_small_square() {
        // 0.02° x 0.02° square: 4e-4 deg² * 111.32² ≈ 4.957 km².
        let area = polygon_area_km2(&square());
        assert!((area - 4.957).abs() < 0.01, "got {area}");
        assert!(polygon_area_km2(&square()[..2]).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_expansion_scales_longitude_by_latitude() {
        let bbox = bounding_box(&square()).unwrap();
        let grown = bbox.expanded(1.0);

        let lat_growth = bbox.min_lat - grown.min_lat;
        let lng_growth = bbox.min_lng - grown.min_lng;

        assert!((lat_growth - 1.0 / KM_PER_DEGREE).abs() < 1e-9);
        // At ~26.9°N a longitude degree is shorter, so the expansion in
        // degrees must be larger than the latitude expansion.
        assert!(lng_growth > lat_growth);
        assert!((lng_growth - 0.010074).abs() < 1e-4, "got {lng_growth}");
    }

    #[test]
    fn bounding_box_contains_its_points() {
        let points = square();
        let bbox = bounding_box(&points).unwrap();
        for point in &points {
            assert!(bbox.contains(*point));
        }
        assert!(!bbox.contains(coord(27.2, 75.79)));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn coordinate_validation() {
        assert!(Coordinate::new(26.9, 75.8).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(91.0, 75.8).is_err());
        assert!(Coordinate::new(26.9, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 75.8).is_err());
        assert!(!coord(f64::NAN, 75.8).is_valid());
    }
}
