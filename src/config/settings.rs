//! Application settings loaded from config.toml.
//!
//! The file is optional. It can name the database, choose the seat bound policy,
//! tune order pagination and list reference data to seed on startup.

use crate::{
    core::{pagination::PaginationSettings, ticket::SeatBound},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Structure of the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Database URL, overridden by the `DATABASE_URL` environment variable
    #[serde(default)]
    pub database_url: Option<String>,
    /// Ticket validation settings
    #[serde(default)]
    pub booking: BookingSettings,
    /// Order listing page sizes
    #[serde(default)]
    pub pagination: PaginationSettings,
    /// Reference data created on startup when missing
    #[serde(default)]
    pub seed: SeedData,
}

/// Ticket validation settings
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct BookingSettings {
    /// Upper bound applied to seat indices
    #[serde(default)]
    pub seat_bound: SeatBound,
}

/// Reference data listed in config.toml
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SeedData {
    /// Stations to create
    #[serde(default)]
    pub stations: Vec<StationSeed>,
    /// Train types to create
    #[serde(default)]
    pub train_types: Vec<String>,
    /// Trains to create, referencing train types by name
    #[serde(default)]
    pub trains: Vec<TrainSeed>,
    /// Crew members to create
    #[serde(default)]
    pub crew: Vec<CrewSeed>,
}

/// A station entry
#[derive(Debug, Clone, Deserialize)]
pub struct StationSeed {
    /// Unique station name
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

/// A train entry
#[derive(Debug, Clone, Deserialize)]
pub struct TrainSeed {
    /// Unique train name
    pub name: String,
    /// Number of cars
    pub cargo_num: i32,
    /// Seats per car
    pub place_in_cargo: i32,
    /// Train type name, created when missing
    pub train_type: String,
}

/// A crew entry
#[derive(Debug, Clone, Deserialize)]
pub struct CrewSeed {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads `CONFIG_PATH` (default ./config.toml), falling back to defaults when absent.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        info!("No configuration file at {}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let config = load_config(&path)?;
    info!(
        "Loaded configuration from {} (seat bound {:?}, {} stations, {} trains to seed)",
        path,
        config.booking.seat_bound,
        config.seed.stations.len(),
        config.seed.trains.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [booking]
            seat_bound = "place_in_cargo"

            [pagination]
            page_size = 10
            max_page_size = 20

            [seed]
            train_types = ["Intercity"]

            [[seed.stations]]
            name = "Kyiv"
            latitude = 50.45
            longitude = 30.52

            [[seed.trains]]
            name = "Hyundai"
            cargo_num = 9
            place_in_cargo = 60
            train_type = "Intercity"

            [[seed.crew]]
            first_name = "Ivan"
            last_name = "Franko"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.booking.seat_bound, SeatBound::PlaceInCargo);
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.pagination.max_page_size, 20);
        assert_eq!(config.seed.stations[0].name, "Kyiv");
        assert_eq!(config.seed.trains[0].place_in_cargo, 60);
        assert_eq!(config.seed.crew[0].last_name, "Franko");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.booking.seat_bound, SeatBound::CargoCount);
        assert_eq!(config.pagination, PaginationSettings::ORDERS);
        assert!(config.seed.stations.is_empty());
    }

    #[test]
    fn test_partial_pagination_table() {
        let config: AppConfig = toml::from_str("[pagination]\npage_size = 7\n").unwrap();
        assert_eq!(config.pagination.page_size, 7);
        assert_eq!(config.pagination.max_page_size, 3);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/rail-booking/config.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("Failed to read config file"));
        assert!(!err.is_client_error());
    }
}
