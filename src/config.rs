use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};

use crate::{evaluation::ThresholdRules, rules::RulesFallback};

// ---------------------------------------------------------------------------
// RulesBackend
// ---------------------------------------------------------------------------

/// Where threshold rules are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesBackend {
    /// Single row in the `threshold_rules` table.
    Postgres,
    /// JSON slot on local disk.
    File,
}

impl FromStr for RulesBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "file" => Ok(Self::File),
            other => Err(anyhow::anyhow!("unknown rules backend: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// The single location the forecast is requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone name; determines where the provider's "today" starts.
    pub timezone: String,
}

impl Default for ForecastLocation {
    /// Wellington, NZ.
    fn default() -> Self {
        Self {
            latitude: -41.2866,
            longitude: 174.7756,
            timezone: "Pacific/Auckland".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub forecast_base_url: String,
    pub location: ForecastLocation,
    /// When set, raw forecast responses are saved under this directory.
    pub forecast_dump_dir: Option<PathBuf>,
    /// Forecast refresh interval in seconds.
    pub refresh_interval_secs: u64,
    /// Upper bound on one forecast request, connect to last body byte.
    pub forecast_timeout_secs: u64,
    pub rules_backend: RulesBackend,
    /// Only used by [`RulesBackend::File`].
    pub rules_file: PathBuf,
    /// What `load` yields when no rules have been saved yet.
    pub rules_fallback: RulesFallback,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_location = ForecastLocation::default();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            forecast_base_url: optional("FORECAST_BASE_URL", "https://api.open-meteo.com"),
            location: ForecastLocation {
                latitude: parse_or("FORECAST_LATITUDE", default_location.latitude)?,
                longitude: parse_or("FORECAST_LONGITUDE", default_location.longitude)?,
                timezone: optional("FORECAST_TIMEZONE", &default_location.timezone),
            },
            forecast_dump_dir: std::env::var("FORECAST_DUMP_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            refresh_interval_secs: parse_secs(
                "REFRESH_INTERVAL_SECS",
                &optional("REFRESH_INTERVAL_SECS", "3600"),
            )?,
            forecast_timeout_secs: parse_secs(
                "FORECAST_TIMEOUT_SECS",
                &optional("FORECAST_TIMEOUT_SECS", "10"),
            )?,
            rules_backend: optional("RULES_BACKEND", "postgres")
                .parse()
                .context("RULES_BACKEND must be 'postgres' or 'file'")?,
            rules_file: PathBuf::from(optional("RULES_FILE", "rules.json")),
            rules_fallback: parse_rules_fallback(&optional("RULES_FALLBACK", "defaults"))?,
        })
    }
}

/// Parse the `RULES_FALLBACK` policy.
///
/// `defaults` falls back to the standard rule set; `none` requires the rules
/// to be configured explicitly through the admin endpoint.
fn parse_rules_fallback(raw: &str) -> Result<RulesFallback> {
    match raw.trim() {
        "defaults" => Ok(RulesFallback::Defaults(ThresholdRules::default())),
        "none" => Ok(RulesFallback::Absent),
        other => Err(anyhow::anyhow!(
            "RULES_FALLBACK must be 'defaults' or 'none', got: {other:?}"
        )),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got: {raw:?}"))?;
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(secs)
}

fn parse_or(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
