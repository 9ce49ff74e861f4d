//! Configuration loading and management.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gb_core::split::DEFAULT_TOTAL_MILLESIMI;
use gb_core::{ConfigurationError, OverduePolicy, RateCard, ShareConfig, ShareTable, ValidationError};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Condominium units and their millesimi, in invoice order.
    pub shares: Vec<ShareConfig>,

    /// The value the share weights must add up to.
    pub total_millesimi: f64,

    /// Hourly rate per work type, in currency units.
    pub rates: BTreeMap<String, f64>,

    /// Whether `predict` reports projections that are already past.
    pub overdue: OverduePolicy,

    pub weather: WeatherConfig,
}

/// OpenWeatherMap settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub units: String,
    pub lang: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("shares", &self.shares)
            .field("total_millesimi", &self.total_millesimi)
            .field("rates", &self.rates)
            .field("overdue", &self.overdue)
            .field("weather", &self.weather)
            .finish()
    }
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("lat", &self.lat)
            .field("lon", &self.lon)
            .field("units", &self.units)
            .field("lang", &self.lang)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let shares = [
            ("Unit A", 201.055),
            ("Unit B", 304.419),
            ("Unit C", 290.081),
            ("Unit D", 204.445),
        ]
        .into_iter()
        .map(|(label, weight)| ShareConfig {
            label: label.to_string(),
            weight,
        })
        .collect();
        let rates = [
            ("Taglio erba", 15.0),
            ("Taglio siepe", 20.0),
            ("Raccolta foglie", 15.0),
        ]
        .into_iter()
        .map(|(label, rate)| (label.to_string(), rate))
        .collect();

        Self {
            database_path: data_dir.join("gb.db"),
            shares,
            total_millesimi: DEFAULT_TOTAL_MILLESIMI,
            rates,
            overdue: OverduePolicy::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            lat: None,
            lon: None,
            units: gb_weather::DEFAULT_UNITS.to_string(),
            lang: gb_weather::DEFAULT_LANG.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    ///
    /// The share table and rate card are validated here so a bad config
    /// fails at startup rather than in the middle of a command.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (GB_*, GB_WEATHER__API_KEY for nested keys)
        figment = figment.merge(Env::prefixed("GB_").split("__"));

        let config: Self = figment
            .extract()
            .context("failed to read configuration")?;
        config.share_table().context("invalid share table")?;
        config.rate_card().context("invalid rate card")?;
        Ok(config)
    }

    pub fn share_table(&self) -> Result<ShareTable, ConfigurationError> {
        ShareTable::new(&self.shares, self.total_millesimi)
    }

    pub fn rate_card(&self) -> Result<RateCard, ValidationError> {
        RateCard::from_units(&self.rates)
    }
}

/// Returns the platform-specific config directory for gb.
///
/// On Linux: `~/.config/gb`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gb"))
}

/// Returns the platform-specific data directory for gb.
///
/// On Linux: `~/.local/share/gb`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("gb"))
}
