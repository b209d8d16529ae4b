//! Seeded tourist-area intelligence for the Rajasthan pilot corridor.
//!
//! The table mixes published city crime rates with per-area observations
//! (footfall, policing, recurring scams) collected during the pilot. City
//! rates are reported per 100 000 residents.

use roamguard_geo::Coordinate;

use crate::{AreaCategory, CityCrimeStats, PolicePresence, TouristArea};

const fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}

/// Tourist areas covered by the pilot deployment.
#[must_use]
pub fn seed_areas() -> Vec<TouristArea> {
    vec![
        TouristArea {
            name: "Johari Bazaar".to_string(),
            coordinate: coord(26.9239, 75.8267),
            category: AreaCategory::Market,
            daily_visitors: 12_000,
            safety_rating: 5.4,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 342.5,
            crime_incidents: 34,
            risk_factors: vec![
                "pickpocketing".to_string(),
                "gem fraud".to_string(),
                "overcharging".to_string(),
            ],
        },
        TouristArea {
            name: "City Palace Jaipur".to_string(),
            coordinate: coord(26.9255, 75.8235),
            category: AreaCategory::Heritage,
            daily_visitors: 6500,
            safety_rating: 8.2,
            police_presence: PolicePresence::High,
            crime_rate_per_100k: 342.5,
            crime_incidents: 8,
            risk_factors: vec!["touts near the entry gates".to_string()],
        },
        TouristArea {
            name: "Amber Fort".to_string(),
            coordinate: coord(26.9855, 75.8513),
            category: AreaCategory::Heritage,
            daily_visitors: 8000,
            safety_rating: 7.8,
            police_presence: PolicePresence::High,
            crime_rate_per_100k: 342.5,
            crime_incidents: 12,
            risk_factors: vec![
                "unlicensed guides".to_string(),
                "monkeys snatching food and bags".to_string(),
            ],
        },
        TouristArea {
            name: "Jaipur Junction Railway Station".to_string(),
            coordinate: coord(26.9196, 75.7880),
            category: AreaCategory::Transport,
            daily_visitors: 25_000,
            safety_rating: 4.8,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 342.5,
            crime_incidents: 41,
            risk_factors: vec![
                "luggage theft".to_string(),
                "drugged food and drink".to_string(),
                "taxi overcharging".to_string(),
            ],
        },
        TouristArea {
            name: "Clock Tower and Sardar Market".to_string(),
            coordinate: coord(26.2960, 73.0169),
            category: AreaCategory::Market,
            daily_visitors: 7000,
            safety_rating: 5.9,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 287.3,
            crime_incidents: 22,
            risk_factors: vec![
                "pickpocketing".to_string(),
                "spice-shop commission scams".to_string(),
            ],
        },
        TouristArea {
            name: "Mehrangarh Fort".to_string(),
            coordinate: coord(26.2979, 73.0185),
            category: AreaCategory::Heritage,
            daily_visitors: 4000,
            safety_rating: 8.0,
            police_presence: PolicePresence::High,
            crime_rate_per_100k: 287.3,
            crime_incidents: 5,
            risk_factors: vec!["steep unguarded ramparts".to_string()],
        },
        TouristArea {
            name: "City Palace Udaipur".to_string(),
            coordinate: coord(24.5764, 73.6832),
            category: AreaCategory::Heritage,
            daily_visitors: 5000,
            safety_rating: 8.6,
            police_presence: PolicePresence::High,
            crime_rate_per_100k: 234.1,
            crime_incidents: 4,
            risk_factors: vec!["crowding at the boat jetty".to_string()],
        },
        TouristArea {
            name: "Pushkar Main Bazaar".to_string(),
            coordinate: coord(26.4889, 74.5511),
            category: AreaCategory::Market,
            daily_visitors: 6000,
            safety_rating: 6.4,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 145.2,
            crime_incidents: 18,
            risk_factors: vec![
                "forced donation rituals at the ghats".to_string(),
                "flower-petal blessing scam".to_string(),
            ],
        },
        TouristArea {
            name: "Jaisalmer Fort".to_string(),
            coordinate: coord(26.9157, 70.9083),
            category: AreaCategory::Heritage,
            daily_visitors: 3000,
            safety_rating: 7.2,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 198.7,
            crime_incidents: 9,
            risk_factors: vec!["aggressive camel-safari touts".to_string()],
        },
        TouristArea {
            name: "Dilwara Temples".to_string(),
            coordinate: coord(24.6554, 72.7120),
            category: AreaCategory::Religious,
            daily_visitors: 2500,
            safety_rating: 8.8,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 89.3,
            crime_incidents: 2,
            risk_factors: vec![],
        },
        TouristArea {
            name: "Nakki Lake".to_string(),
            coordinate: coord(24.5926, 72.7156),
            category: AreaCategory::Nature,
            daily_visitors: 3500,
            safety_rating: 7.5,
            police_presence: PolicePresence::Moderate,
            crime_rate_per_100k: 89.3,
            crime_incidents: 6,
            risk_factors: vec!["slippery steps at the boating jetty".to_string()],
        },
    ]
}

/// City-level crime statistics backing the per-area rates.
#[must_use]
pub fn city_crime_stats() -> Vec<CityCrimeStats> {
    vec![
        CityCrimeStats {
            city: "Jaipur".to_string(),
            reported_incidents: 15_420,
            rate_per_100k: 342.5,
        },
        CityCrimeStats {
            city: "Jodhpur".to_string(),
            reported_incidents: 8934,
            rate_per_100k: 287.3,
        },
        CityCrimeStats {
            city: "Udaipur".to_string(),
            reported_incidents: 4567,
            rate_per_100k: 234.1,
        },
        CityCrimeStats {
            city: "Jaisalmer".to_string(),
            reported_incidents: 892,
            rate_per_100k: 198.7,
        },
        CityCrimeStats {
            city: "Pushkar".to_string(),
            reported_incidents: 678,
            rate_per_100k: 145.2,
        },
        CityCrimeStats {
            city: "Mount Abu".to_string(),
            reported_incidents: 234,
            rate_per_100k: 89.3,
        },
    ]
}
