use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::DailyWeatherRecord,
    evaluation::{DailyObservation, DayTier, EvaluationResult, ThresholdRules},
    refresh::RefreshReport,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObservationDto {
    pub date: NaiveDate,
    /// Degrees Celsius
    pub temperature: f64,
    /// km/h
    pub wind_speed: f64,
    /// 0–100 proxy derived from the weather code; not a measured percentage.
    pub sunniness: u8,
    /// Millimetres between 06:00 and 18:00
    pub rain: f64,
    /// Data provenance link.
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluationDto {
    pub temperature_ok: bool,
    pub wind_ok: bool,
    pub sunniness_ok: bool,
    pub rain_ok: bool,
    /// 0..=4
    pub criteria_met: u8,
    pub is_good_day: bool,
    pub tier: DayTier,
    /// "NO" on a good day (you can't beat Wellington), "YES" otherwise.
    pub answer: String,
    pub headline: String,
}

/// Response for `GET /today`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodayResponse {
    /// `null` until the first forecast fetch has completed.
    pub observation: Option<ObservationDto>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// `null` when no rules are configured and no defaults apply.
    pub rules: Option<ThresholdRules>,
    pub evaluation: EvaluationDto,
}

/// Response for `POST /refresh`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub observation: ObservationDto,
    pub rules: Option<ThresholdRules>,
    pub evaluation: EvaluationDto,
    /// Whether the daily record was written.
    pub persisted: bool,
    /// `true` for a new row, `false` for an update; `null` if not persisted.
    pub inserted: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyRecordDto {
    pub date: NaiveDate,
    pub is_good_day: bool,
    pub temperature: f64,
    pub wind_speed: f64,
    pub sunniness: i32,
    pub rain: f64,
}

impl From<DailyObservation> for ObservationDto {
    fn from(o: DailyObservation) -> Self {
        Self {
            date: o.date,
            temperature: o.temperature,
            wind_speed: o.wind_speed,
            sunniness: o.sunniness,
            rain: o.rain,
            source: o.source,
        }
    }
}

impl From<EvaluationResult> for EvaluationDto {
    fn from(e: EvaluationResult) -> Self {
        Self {
            temperature_ok: e.temperature_ok,
            wind_ok: e.wind_ok,
            sunniness_ok: e.sunniness_ok,
            rain_ok: e.rain_ok,
            criteria_met: e.criteria_met,
            is_good_day: e.is_good_day,
            tier: e.tier,
            answer: e.tier.answer().to_owned(),
            headline: e.tier.headline().to_owned(),
        }
    }
}

impl From<RefreshReport> for RefreshResponse {
    fn from(r: RefreshReport) -> Self {
        Self {
            observation: r.observation.into(),
            rules: r.rules,
            evaluation: r.evaluation.into(),
            persisted: r.persisted.is_some(),
            inserted: r.persisted.map(|p| p.inserted),
        }
    }
}

impl From<DailyWeatherRecord> for DailyRecordDto {
    fn from(r: DailyWeatherRecord) -> Self {
        Self {
            date: r.date,
            is_good_day: r.is_good_day,
            temperature: r.temperature,
            wind_speed: r.wind_speed,
            sunniness: r.sunniness,
            rain: r.rain,
        }
    }
}
