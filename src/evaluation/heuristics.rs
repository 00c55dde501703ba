//! Reductions from raw forecast fields to the scalar inputs of the evaluator.

/// Hour-of-day window (inclusive start, exclusive end) counted as daytime:
/// 06:00 up to 18:00 local time.
pub const DAYTIME_HOURS: std::ops::Range<usize> = 6..18;

/// Map a WMO weather code to a 0–100 "sunniness" score.
///
/// This is a lossy proxy for the sky category, not a measured irradiance or
/// cloud-cover percentage. Bands, first match wins:
///
/// | Code      | Category                | Score |
/// |-----------|-------------------------|-------|
/// | `..=3`    | clear / mainly clear    | 100   |
/// | `4..=48`  | cloudy / fog            | 70    |
/// | `49..=67` | drizzle / rain          | 50    |
/// | `68..=77` | snow                    | 30    |
/// | `78..`    | showers / thunderstorm  | 10    |
///
/// Every input yields a score, including codes outside the documented WMO
/// range.
pub fn sunniness(weather_code: i32) -> u8 {
    if weather_code <= 3 {
        100
    } else if weather_code <= 48 {
        70
    } else if weather_code <= 67 {
        50
    } else if weather_code <= 77 {
        30
    } else {
        10
    }
}

/// Sum hourly precipitation (mm) over [`DAYTIME_HOURS`].
///
/// `hourly` is expected to hold the 24 hourly values of a single calendar day
/// starting at midnight. Shorter input is not an error: missing hours simply
/// contribute nothing, so the result undercounts.
pub fn daytime_rain(hourly: &[f64]) -> f64 {
    hourly
        .iter()
        .take(DAYTIME_HOURS.end)
        .skip(DAYTIME_HOURS.start)
        .sum()
}
