//! OpenWeatherMap integration for garden bookkeeping.
//!
//! Fetches current conditions and the five-day forecast for the garden's
//! location and reshapes them into the figures shown by the `weather` command.
//! Response shaping is kept separate from HTTP so it can be tested offline.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_LANG: &str = "it";

/// Number of days kept from the forecast.
pub const FORECAST_DAYS: usize = 5;

const MPS_TO_KMH: f64 = 3.6;

/// Weather client errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Coordinates out of range.
    #[error("invalid location: latitude {lat}, longitude {lon}")]
    InvalidLocation { lat: f64, lon: f64 },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Garden coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherError::InvalidLocation { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Current conditions at the garden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temp: i64,
    pub feels_like: i64,
    pub humidity: u32,
    pub pressure: u32,
    pub wind_kmh: i64,
    pub wind_deg: u32,
    pub clouds: u32,
    pub visibility_km: Option<f64>,
    pub description: String,
    pub icon: String,
    /// Local time at the location.
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Forecast summary for one local day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: i64,
    pub temp_max: i64,
    /// Taken from the day's first slot.
    pub description: String,
    pub icon: String,
}

/// OpenWeatherMap API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    units: String,
    lang: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(WeatherError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(WeatherError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(WeatherError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: DEFAULT_UNITS.to_string(),
            lang: DEFAULT_LANG.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Fetches current conditions.
    pub async fn current(&self, location: Location) -> Result<CurrentWeather, WeatherError> {
        let body = self.get("weather", location).await?;
        let payload: CurrentResponse = serde_json::from_str(&body)
            .map_err(|err| WeatherError::InvalidResponse(err.to_string()))?;
        shape_current(payload)
    }

    /// Fetches the forecast, one entry per local day.
    pub async fn forecast(&self, location: Location) -> Result<Vec<DailyForecast>, WeatherError> {
        let body = self.get("forecast", location).await?;
        let payload: ForecastResponse = serde_json::from_str(&body)
            .map_err(|err| WeatherError::InvalidResponse(err.to_string()))?;
        shape_forecast(payload)
    }

    async fn get(&self, endpoint: &str, location: Location) -> Result<String, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, lat = location.lat, lon = location.lon, "requesting weather");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
                ("lang", self.lang.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| WeatherError::Api {
                message: format!("status {status}: {body}"),
            }));
        }
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    wind: WindBlock,
    clouds: CloudsBlock,
    #[serde(default)]
    visibility: Option<f64>,
    weather: Vec<ConditionBlock>,
    sys: SysBlock,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: u32,
    #[serde(default)]
    pressure: u32,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
    #[serde(default)]
    deg: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CloudsBlock {
    all: u32,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastSlot>,
    #[serde(default)]
    city: Option<CityBlock>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    dt: i64,
    main: MainBlock,
    weather: Vec<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
struct CityBlock {
    #[serde(default)]
    timezone: i32,
}

fn shape_current(payload: CurrentResponse) -> Result<CurrentWeather, WeatherError> {
    let offset = utc_offset(payload.timezone)?;
    let condition = first_condition(payload.weather)?;
    Ok(CurrentWeather {
        temp: round(payload.main.temp),
        feels_like: round(payload.main.feels_like),
        humidity: payload.main.humidity,
        pressure: payload.main.pressure,
        wind_kmh: round(payload.wind.speed * MPS_TO_KMH),
        wind_deg: payload.wind.deg.unwrap_or(0),
        clouds: payload.clouds.all,
        visibility_km: payload
            .visibility
            .filter(|metres| *metres > 0.0)
            .map(|metres| metres / 1000.0),
        description: condition.description,
        icon: condition.icon,
        sunrise: local_datetime(payload.sys.sunrise, offset)?.time(),
        sunset: local_datetime(payload.sys.sunset, offset)?.time(),
    })
}

/// Groups three-hour slots by local date, keeping the first
/// [`FORECAST_DAYS`] days.
fn shape_forecast(payload: ForecastResponse) -> Result<Vec<DailyForecast>, WeatherError> {
    struct Day {
        min: f64,
        max: f64,
        description: String,
        icon: String,
    }

    let offset = utc_offset(payload.city.map_or(0, |city| city.timezone))?;
    let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    for slot in payload.list {
        let date = local_datetime(slot.dt, offset)?.date_naive();
        let min = slot.main.temp_min.unwrap_or(slot.main.temp);
        let max = slot.main.temp_max.unwrap_or(slot.main.temp);
        if let Some(day) = days.get_mut(&date) {
            day.min = day.min.min(min);
            day.max = day.max.max(max);
            continue;
        }
        let condition = first_condition(slot.weather)?;
        days.insert(
            date,
            Day {
                min,
                max,
                description: condition.description,
                icon: condition.icon,
            },
        );
    }

    Ok(days
        .into_iter()
        .take(FORECAST_DAYS)
        .map(|(date, day)| DailyForecast {
            date,
            temp_min: round(day.min),
            temp_max: round(day.max),
            description: day.description,
            icon: day.icon,
        })
        .collect())
}

fn first_condition(conditions: Vec<ConditionBlock>) -> Result<ConditionBlock, WeatherError> {
    conditions
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::InvalidResponse("missing weather condition".to_string()))
}

fn utc_offset(seconds: i32) -> Result<FixedOffset, WeatherError> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| WeatherError::InvalidResponse(format!("invalid timezone offset {seconds}")))
}

fn local_datetime(timestamp: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, WeatherError> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| WeatherError::InvalidResponse(format!("invalid timestamp {timestamp}")))
}

/// Rounds half away from zero, as displayed.
#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    value.round() as i64
}

fn parse_api_error(body: &str) -> Option<WeatherError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| WeatherError::Api {
            message: payload.message,
        })
}
