//! Parsing of raw OpenWeatherMap payloads into typed records.
//!
//! Parsing is deliberately lenient: any body that decodes as JSON of the
//! expected general shape yields a record, with absent fields mapped to
//! zero values. Structural sanity is checked afterwards by the caller via
//! [`CurrentWeather::is_valid`] / [`Forecast::is_valid`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::model::{CurrentWeather, Forecast, ForecastEntry};

/// Textual timestamp format used in forecast `dt_txt` fields.
const FORECAST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
struct RawCoord {
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawMain {
    #[serde(default)]
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    temp_min: f64,
    #[serde(default)]
    temp_max: f64,
    #[serde(default)]
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawCondition {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    id: i32,
}

#[derive(Debug, Default, Deserialize)]
struct RawWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: i32,
    #[serde(default)]
    gust: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawClouds {
    #[serde(default)]
    all: i32,
}

#[derive(Debug, Default, Deserialize)]
struct RawSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawCurrent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    id: i64,
    #[serde(default)]
    coord: RawCoord,
    #[serde(default)]
    main: RawMain,
    #[serde(default)]
    weather: Vec<RawCondition>,
    #[serde(default)]
    wind: RawWind,
    #[serde(default)]
    clouds: RawClouds,
    #[serde(default)]
    sys: RawSys,
    #[serde(default)]
    visibility: f64,
    #[serde(default)]
    dt: i64,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Default, Deserialize)]
struct RawCity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    coord: RawCoord,
}

#[derive(Debug, Default, Deserialize)]
struct RawForecastEntry {
    #[serde(default)]
    dt_txt: String,
    #[serde(default)]
    main: RawMain,
    #[serde(default)]
    weather: Vec<RawCondition>,
    #[serde(default)]
    wind: RawWind,
    #[serde(default)]
    clouds: RawClouds,
    /// Precipitation probability as a 0.0–1.0 fraction.
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawForecast {
    #[serde(default)]
    city: RawCity,
    #[serde(default)]
    list: Vec<RawForecastEntry>,
}

fn epoch_to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Parse a `/weather` response body into a [`CurrentWeather`] record.
///
/// Fails only when the body is not decodable JSON; missing substructures
/// fall back to zero values.
pub fn parse_current(body: &str) -> serde_json::Result<CurrentWeather> {
    let raw: RawCurrent = serde_json::from_str(body)?;

    let condition = raw.weather.into_iter().next().unwrap_or_default();

    Ok(CurrentWeather {
        city_name: raw.name,
        country_code: raw.sys.country,
        city_id: raw.id,
        latitude: raw.coord.lat,
        longitude: raw.coord.lon,
        temperature: raw.main.temp,
        feels_like: raw.main.feels_like,
        temperature_min: raw.main.temp_min,
        temperature_max: raw.main.temp_max,
        main_condition: condition.main,
        description: condition.description,
        icon_code: condition.icon,
        condition_id: condition.id,
        humidity: raw.main.humidity,
        pressure: raw.main.pressure,
        wind_speed: raw.wind.speed,
        wind_direction: raw.wind.deg,
        visibility: raw.visibility,
        cloudiness: raw.clouds.all,
        observed_at: epoch_to_utc(raw.dt),
        sunrise: epoch_to_utc(raw.sys.sunrise),
        sunset: epoch_to_utc(raw.sys.sunset),
        timezone_offset_secs: raw.timezone,
    })
}

/// Parse a `/forecast` response body into a [`Forecast`] bundle,
/// stamped with the current time as retrieval instant.
pub fn parse_forecast(body: &str) -> serde_json::Result<Forecast> {
    let raw: RawForecast = serde_json::from_str(body)?;

    let entries = raw.list.into_iter().map(parse_forecast_entry).collect();

    Ok(Forecast {
        city_name: raw.city.name,
        latitude: raw.city.coord.lat,
        longitude: raw.city.coord.lon,
        entries,
        retrieved_at: Utc::now(),
    })
}

fn parse_forecast_entry(raw: RawForecastEntry) -> ForecastEntry {
    // An unparseable slot timestamp degrades to the epoch; the entry
    // still participates in day-bucketing.
    let date_time = NaiveDateTime::parse_from_str(&raw.dt_txt, FORECAST_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let condition = raw.weather.into_iter().next().unwrap_or_default();

    ForecastEntry {
        date_time,
        temperature: raw.main.temp,
        feels_like: raw.main.feels_like,
        humidity: raw.main.humidity,
        pressure: raw.main.pressure,
        main_condition: condition.main,
        description: condition.description,
        icon_code: condition.icon,
        condition_id: condition.id,
        wind_speed: raw.wind.speed,
        wind_direction: raw.wind.deg,
        wind_gust: raw.wind.gust,
        cloudiness: raw.clouds.all,
        precipitation_probability: raw.pop * 100.0,
    }
}
