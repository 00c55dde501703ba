use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::evaluation::{daytime_rain, sunniness, DailyObservation};

/// Attribution shown next to every observation built from this provider.
pub const SOURCE_URL: &str = "https://open-meteo.com/";

/// Daily fields requested from `/v1/forecast`.
pub const DAILY_FIELDS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,wind_speed_10m_max,precipitation_sum";

/// Hourly fields requested from `/v1/forecast`.
pub const HOURLY_FIELDS: &str = "precipitation";

// ---------------------------------------------------------------------------
// Wire types: GET /v1/forecast
//
// Open-Meteo returns column-oriented arrays: index 0 of every `daily` array
// is the first forecast day in the requested timezone, i.e. "today". Only
// the columns read below are modelled; serde skips the rest.
//
//   {
//     "latitude": -41.25, "longitude": 174.75, "timezone": "Pacific/Auckland",
//     "daily":  { "time": ["2026-01-15", ...], "weather_code": [2, ...], ... },
//     "hourly": { "time": ["2026-01-15T00:00", ...], "precipitation": [0.0, ...] }
//   }
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub daily: DailyForecast,
    /// Absent when hourly fields were not requested.
    pub hourly: Option<HourlyForecast>,
}

/// Daily columns. Missing columns deserialise as empty and are reported by
/// [`DailyObservation::try_from`] rather than by serde.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DailyForecast {
    /// ISO dates, e.g. `"2026-01-15"`.
    pub time: Vec<String>,
    /// WMO weather interpretation codes.
    pub weather_code: Vec<Option<i32>>,
    /// °C
    pub temperature_2m_max: Vec<Option<f64>>,
    /// °C
    pub temperature_2m_min: Vec<Option<f64>>,
    /// km/h
    pub wind_speed_10m_max: Vec<Option<f64>>,
    /// mm
    pub precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HourlyForecast {
    /// mm per hour, starting at local midnight of today. Open-Meteo emits `null` for hours it has no value for.
    pub precipitation: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Conversion into the domain observation
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("forecast response is missing '{0}' for today")]
    MissingField(&'static str),
    #[error("forecast date {0:?} is not an ISO date")]
    InvalidDate(String),
}

/// First element of a daily column, treating an empty column and a `null`
/// value the same way.
fn today<T: Copy>(column: &[Option<T>], name: &'static str) -> Result<T, ForecastError> {
    column
        .first()
        .copied()
        .flatten()
        .ok_or(ForecastError::MissingField(name))
}

impl TryFrom<&ForecastResponse> for DailyObservation {
    type Error = ForecastError;

    /// Build today's observation.
    ///
    /// - temperature: mean of the daily max and min
    /// - wind speed: daily max at 10 m
    /// - sunniness: derived from the daily weather code
    /// - rain: daytime sum of the first 24 hourly values when hourly data is
    ///   present, otherwise the daily precipitation sum
    fn try_from(resp: &ForecastResponse) -> Result<Self, Self::Error> {
        let daily = &resp.daily;

        let raw_date = daily.time.first().ok_or(ForecastError::MissingField("time"))?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| ForecastError::InvalidDate(raw_date.clone()))?;

        let code = today(&daily.weather_code, "weather_code")?;
        let t_max = today(&daily.temperature_2m_max, "temperature_2m_max")?;
        let t_min = today(&daily.temperature_2m_min, "temperature_2m_min")?;
        let wind = today(&daily.wind_speed_10m_max, "wind_speed_10m_max")?;

        let rain = match resp.hourly.as_ref().filter(|h| !h.precipitation.is_empty()) {
            Some(hourly) => {
                let first_day: Vec<f64> = hourly
                    .precipitation
                    .iter()
                    .take(24)
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                daytime_rain(&first_day)
            }
            None => today(&daily.precipitation_sum, "precipitation_sum")?,
        };

        Ok(Self {
            date,
            temperature: (t_max + t_min) / 2.0,
            wind_speed: wind,
            sunniness: sunniness(code),
            rain,
            source: SOURCE_URL.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
