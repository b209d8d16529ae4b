#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for the tourist safety monitor.
//!
//! Wraps a seeded [`SafetyMonitor`] in a handful of subcommands: one-off
//! location checks printed as JSON, listings of the restricted zones and
//! scored tourist areas, and canned incident scenarios that replay sensor
//! batches through the full detection pipeline with alerts streamed to
//! the terminal.

mod scenarios;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use roamguard_alerts::{ChannelSink, LogSink};
use roamguard_geo::Coordinate;
use roamguard_monitor::{MonitorConfig, SafetyMonitor};
use roamguard_risk::areas::city_crime_stats;

#[derive(Parser)]
#[command(name = "roamguard_cli", about = "Tourist safety monitoring toolkit")]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess the risk at a coordinate
    CheckLocation {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// User identifier recorded on any raised alert
        #[arg(long, default_value = "cli-user")]
        user: String,
        /// Assessment instant, RFC 3339 (e.g. "2026-03-14T22:30:00Z"); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// List the restricted zones
    Zones,
    /// List the scored tourist areas and the city crime table
    Areas,
    /// Replay a canned incident scenario through the monitor
    Simulate {
        /// Scenario name: fall, crash, distress or breach-walk
        scenario: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::CheckLocation { lat, lng, user, at } => {
            let at = match at {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc),
                None => Utc::now(),
            };
            let monitor = SafetyMonitor::seeded(config, Arc::new(LogSink));
            let assessment = monitor.check_location(
                &user,
                Coordinate {
                    latitude: lat,
                    longitude: lng,
                },
                at,
            );
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Commands::Zones => {
            let monitor = SafetyMonitor::seeded(config, Arc::new(LogSink));
            println!("{:<4} {:<38} {:<12} {:<6} VERTICES", "ID", "NAME", "TYPE", "RISK");
            println!("{}", "-".repeat(72));
            for zone in monitor.zones_snapshot() {
                println!(
                    "{:<4} {:<38} {:<12} {:<6} {}",
                    zone.id,
                    zone.name,
                    zone.zone_type,
                    zone.risk_level,
                    zone.polygon.len()
                );
            }
        }
        Commands::Areas => {
            let monitor = SafetyMonitor::seeded(config, Arc::new(LogSink));
            println!(
                "{:<34} {:<10} {:>9} {:>7} {:<9}",
                "NAME", "CATEGORY", "VISITORS", "SAFETY", "POLICE"
            );
            println!("{}", "-".repeat(75));
            for area in monitor.areas() {
                println!(
                    "{:<34} {:<10} {:>9} {:>7.1} {:<9}",
                    area.name,
                    area.category,
                    area.daily_visitors,
                    area.safety_rating,
                    area.police_presence
                );
            }
            println!();
            println!("{:<12} {:>10} {:>14}", "CITY", "INCIDENTS", "RATE/100K");
            println!("{}", "-".repeat(38));
            for stats in city_crime_stats() {
                println!(
                    "{:<12} {:>10} {:>14.1}",
                    stats.city, stats.reported_incidents, stats.rate_per_100k
                );
            }
        }
        Commands::Simulate { scenario } => {
            let (sink, mut rx) = ChannelSink::new();
            let monitor = SafetyMonitor::seeded(config, Arc::new(sink));
            let listener = tokio::spawn(async move {
                while let Some(alert) = rx.recv().await {
                    println!(
                        "[ALERT] {} {} for {}: {} (confidence {:.2})",
                        alert.priority,
                        alert.alert_type,
                        alert.user_id,
                        alert.message,
                        alert.confidence
                    );
                }
            });
            scenarios::run(&monitor, &scenario)?;
            // Dropping the monitor closes the alert channel and lets the
            // listener drain and exit.
            drop(monitor);
            listener.await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            log::info!("Loaded configuration from {}", path.display());
            Ok(MonitorConfig::from_toml_str(&raw)?)
        }
        None => Ok(MonitorConfig::default()),
    }
}
