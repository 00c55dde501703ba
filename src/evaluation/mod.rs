pub mod heuristics;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use heuristics::{daytime_rain, sunniness};

// ---------------------------------------------------------------------------
// ThresholdRules
// ---------------------------------------------------------------------------

/// The four bounds that define a good day.
///
/// Each field is an independent comparison bound; no ordering between fields
/// is enforced. A nonsensical configuration (e.g. a negative `max_wind`)
/// simply makes the corresponding criterion fail every day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThresholdRules {
    /// Degrees Celsius. Passes when `temperature >= min_temp`.
    pub min_temp: f64,
    /// km/h. Passes when `wind_speed < max_wind` (strict).
    pub max_wind: f64,
    /// 0–100. Passes when `sunniness >= min_sunniness`.
    pub min_sunniness: f64,
    /// Millimetres. Passes when `rain <= max_rain`.
    pub max_rain: f64,
}

impl Default for ThresholdRules {
    /// The standard Wellington rule set: 18 °C, under 10 km/h, 90 % sunny, dry.
    fn default() -> Self {
        Self {
            min_temp: 18.0,
            max_wind: 10.0,
            min_sunniness: 90.0,
            max_rain: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// DailyObservation
// ---------------------------------------------------------------------------

/// Today's normalised forecast, as fed to [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    /// Forecast day this observation describes.
    pub date: NaiveDate,
    /// Degrees Celsius (mean of the daily max and min).
    pub temperature: f64,
    /// km/h (daily max at 10 m).
    pub wind_speed: f64,
    /// 0–100, see [`heuristics::sunniness`].
    pub sunniness: u8,
    /// Millimetres of daytime rain.
    pub rain: f64,
    /// Provenance URI, for display only.
    pub source: String,
}

// ---------------------------------------------------------------------------
// EvaluationResult
// ---------------------------------------------------------------------------

/// Display tier derived from how many criteria passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayTier {
    /// All four criteria met.
    GoodDay,
    /// Exactly three of four met.
    SoClose,
    NotGoodDay,
}

impl DayTier {
    fn from_count(met: u8) -> Self {
        match met {
            4 => Self::GoodDay,
            3 => Self::SoClose,
            _ => Self::NotGoodDay,
        }
    }

    /// Human-readable verdict line.
    pub fn headline(self) -> &'static str {
        match self {
            Self::GoodDay => "You can't beat Wellington on a good day",
            Self::SoClose => "So close! Wellington is nearly unbeatable today",
            Self::NotGoodDay => "You can beat Wellington today",
        }
    }

    /// Answer to "Can you beat Wellington?". Only a good day is unbeatable.
    pub fn answer(self) -> &'static str {
        match self {
            Self::GoodDay => "NO",
            Self::SoClose | Self::NotGoodDay => "YES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub temperature_ok: bool,
    pub wind_ok: bool,
    pub sunniness_ok: bool,
    pub rain_ok: bool,
    /// Number of passing criteria, 0..=4.
    pub criteria_met: u8,
    pub is_good_day: bool,
    pub tier: DayTier,
}

impl EvaluationResult {
    fn from_flags(temperature_ok: bool, wind_ok: bool, sunniness_ok: bool, rain_ok: bool) -> Self {
        let criteria_met = [temperature_ok, wind_ok, sunniness_ok, rain_ok]
            .into_iter()
            .filter(|ok| *ok)
            .count() as u8;

        Self {
            temperature_ok,
            wind_ok,
            sunniness_ok,
            rain_ok,
            criteria_met,
            is_good_day: criteria_met == 4,
            tier: DayTier::from_count(criteria_met),
        }
    }

    /// Result reported while either input is unavailable.
    pub fn none_met() -> Self {
        Self::from_flags(false, false, false, false)
    }
}

/// Compare an observation against the rules, criterion by criterion.
///
/// Every criterion is checked regardless of the others. Wind is the only
/// strict comparison: `wind_speed == max_wind` fails.
///
/// Either input may be absent (nothing fetched yet, or no rules configured);
/// the result is then zero criteria met and not a good day.
pub fn evaluate(
    observation: Option<&DailyObservation>,
    rules: Option<&ThresholdRules>,
) -> EvaluationResult {
    let (Some(obs), Some(rules)) = (observation, rules) else {
        return EvaluationResult::none_met();
    };

    EvaluationResult::from_flags(
        obs.temperature >= rules.min_temp,
        obs.wind_speed < rules.max_wind,
        f64::from(obs.sunniness) >= rules.min_sunniness,
        obs.rain <= rules.max_rain,
    )
}
