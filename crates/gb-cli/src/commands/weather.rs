//! Weather command for conditions at the garden.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use gb_weather::{Client, CurrentWeather, DailyForecast, Location};
use serde::Serialize;

use crate::config::WeatherConfig;

#[derive(Debug, Args)]
pub struct WeatherArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    current: CurrentWeather,
    forecast: Vec<DailyForecast>,
}

pub fn run<W: Write>(writer: &mut W, args: &WeatherArgs, config: &WeatherConfig) -> Result<()> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "missing OpenWeatherMap API key (set GB_WEATHER__API_KEY or [weather] api_key)"
            )
        })?;
    let location = location(config)?;

    let client = Client::new(api_key)
        .context("failed to create weather client")?
        .with_units(config.units.clone())
        .with_lang(config.lang.clone());
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let report = runtime.block_on(async {
        let current = client
            .current(location)
            .await
            .context("failed to fetch current weather")?;
        let forecast = client
            .forecast(location)
            .await
            .context("failed to fetch forecast")?;
        anyhow::Ok(Report { current, forecast })
    })?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_report(writer, &report)?;
    }
    Ok(())
}

fn location(config: &WeatherConfig) -> Result<Location> {
    let (Some(lat), Some(lon)) = (config.lat, config.lon) else {
        anyhow::bail!("missing garden location (set [weather] lat and lon)");
    };
    Ok(Location::new(lat, lon)?)
}

fn write_report<W: Write>(writer: &mut W, report: &Report) -> Result<()> {
    let current = &report.current;
    writeln!(
        writer,
        "Now: {}°C (feels like {}°C), {}",
        current.temp, current.feels_like, current.description
    )?;
    writeln!(
        writer,
        "Humidity {}%  Pressure {} hPa  Clouds {}%",
        current.humidity, current.pressure, current.clouds
    )?;
    writeln!(
        writer,
        "Wind {} km/h from {}°",
        current.wind_kmh, current.wind_deg
    )?;
    if let Some(visibility) = current.visibility_km {
        writeln!(writer, "Visibility {visibility:.1} km")?;
    }
    writeln!(
        writer,
        "Sunrise {}  Sunset {}",
        current.sunrise.format("%H:%M"),
        current.sunset.format("%H:%M")
    )?;

    if !report.forecast.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Forecast")?;
        for day in &report.forecast {
            writeln!(
                writer,
                "  {}  {:>3}°C / {:>3}°C  {}",
                gb_core::format_work_date(day.date),
                day.temp_min,
                day.temp_max,
                day.description
            )?;
        }
    }
    Ok(())
}
