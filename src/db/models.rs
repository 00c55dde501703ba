use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::evaluation::{DailyObservation, EvaluationResult, ThresholdRules};

/// Row of the single-row `threshold_rules` table.
#[derive(Debug, Clone, FromRow)]
pub struct StoredRules {
    pub min_temp: f64,
    pub max_wind: f64,
    pub min_sunniness: f64,
    pub max_rain: f64,
}

impl From<StoredRules> for ThresholdRules {
    fn from(r: StoredRules) -> Self {
        Self {
            min_temp: r.min_temp,
            max_wind: r.max_wind,
            min_sunniness: r.min_sunniness,
            max_rain: r.max_rain,
        }
    }
}

/// One row of `daily_weather_records`: the verdict and observation for a date.
///
/// `date` is the primary key; a later write for the same date replaces the
/// other fields in place.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DailyWeatherRecord {
    pub date: NaiveDate,
    pub is_good_day: bool,
    /// Degrees Celsius
    pub temperature: f64,
    /// km/h
    pub wind_speed: f64,
    /// 0–100
    pub sunniness: i32,
    /// Millimetres
    pub rain: f64,
}

impl DailyWeatherRecord {
    pub fn new(observation: &DailyObservation, evaluation: &EvaluationResult) -> Self {
        Self {
            date: observation.date,
            is_good_day: evaluation.is_good_day,
            temperature: observation.temperature,
            wind_speed: observation.wind_speed,
            sunniness: i32::from(observation.sunniness),
            rain: observation.rain,
        }
    }
}
