//! Fixed seed zones loaded at startup.
//!
//! The production deployment replaces or extends these from operator
//! configuration; the seed set covers the known restricted areas around
//! Jaipur plus the western border and mining corridors.

use roamguard_geo::Coordinate;

use crate::{ZoneDefinition, ZoneType};

const fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}

/// The built-in restricted zones, in registration order.
#[must_use]
pub fn seed_zones() -> Vec<ZoneDefinition> {
    vec![
        ZoneDefinition {
            name: "Military Zone Alpha".into(),
            zone_type: ZoneType::Military,
            polygon: vec![
                coord(26.9124, 75.7873),
                coord(26.9150, 75.7900),
                coord(26.9100, 75.7950),
                coord(26.9080, 75.7920),
            ],
            risk_level: 5,
        },
        ZoneDefinition {
            name: "Wildlife Sanctuary - Restricted Area".into(),
            zone_type: ZoneType::Wildlife,
            polygon: vec![
                coord(26.9200, 75.8000),
                coord(26.9250, 75.8050),
                coord(26.9200, 75.8100),
                coord(26.9150, 75.8050),
            ],
            risk_level: 3,
        },
        ZoneDefinition {
            name: "Border Security Zone".into(),
            zone_type: ZoneType::Border,
            polygon: vec![
                coord(28.0000, 70.5000),
                coord(28.0200, 70.5200),
                coord(28.0100, 70.5400),
                coord(27.9900, 70.5200),
            ],
            risk_level: 4,
        },
        ZoneDefinition {
            name: "Mining Area - Dangerous".into(),
            zone_type: ZoneType::Industrial,
            polygon: vec![
                coord(25.5000, 74.5000),
                coord(25.5100, 74.5100),
                coord(25.5050, 74.5200),
                coord(25.4950, 74.5100),
            ],
            risk_level: 3,
        },
    ]
}
