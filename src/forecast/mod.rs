pub mod models;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{config::ForecastLocation, evaluation::DailyObservation, response_store};

use self::models::{ForecastResponse, DAILY_FIELDS, HOURLY_FIELDS};

/// Open-Meteo forecast client for a single fixed location.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
    location: ForecastLocation,
    dump_dir: Option<PathBuf>,
}

impl ForecastClient {
    /// `timeout` bounds each request end to end, so a provider that accepts
    /// the connection and never answers still yields an error.
    pub fn new(
        base_url: &str,
        location: ForecastLocation,
        dump_dir: Option<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build forecast HTTP client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_owned(),
                location,
                dump_dir,
            }),
        })
    }

    fn forecast_url(&self) -> Result<Url> {
        let loc = &self.inner.location;
        Url::parse_with_params(
            &format!("{}/v1/forecast", self.inner.base_url),
            &[
                ("latitude", loc.latitude.to_string()),
                ("longitude", loc.longitude.to_string()),
                ("daily", DAILY_FIELDS.to_owned()),
                ("hourly", HOURLY_FIELDS.to_owned()),
                ("timezone", loc.timezone.clone()),
            ],
        )
        .with_context(|| format!("invalid forecast base URL: {}", self.inner.base_url))
    }

    /// Fetch the forecast and reduce it to today's observation.
    ///
    /// One attempt only. Transport errors (timeouts included), non-2xx
    /// statuses, malformed bodies and missing fields go back to the caller.
    pub async fn fetch_today(&self) -> Result<DailyObservation> {
        let url = self.forecast_url()?;
        debug!(url = %url, "Requesting forecast");

        let bytes = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .context("forecast request failed")?
            .error_for_status()
            .context("forecast endpoint returned error status")?
            .bytes()
            .await
            .context("failed to read forecast response body")?;

        if let Some(dir) = &self.inner.dump_dir {
            response_store::save(dir, "forecast", &bytes).await;
        }

        let resp = serde_json::from_slice::<ForecastResponse>(&bytes)
            .context("failed to deserialize forecast response")?;

        let observation = DailyObservation::try_from(&resp)?;
        debug!(
            date = %observation.date,
            temperature = observation.temperature,
            wind_speed = observation.wind_speed,
            sunniness = observation.sunniness,
            rain = observation.rain,
            "Forecast reduced to today's observation"
        );
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{forecast_body, spawn_forecast_server, spawn_silent_server};
    use axum::http::StatusCode;

    fn client(base_url: &str, dump_dir: Option<PathBuf>) -> ForecastClient {
        ForecastClient::new(
            base_url,
            ForecastLocation::default(),
            dump_dir,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn url_carries_location_and_fields() {
        let url = client("https://api.open-meteo.com/", None).forecast_url().unwrap();
        assert_eq!(url.path(), "/v1/forecast");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["latitude"], "-41.2866");
        assert_eq!(pairs["longitude"], "174.7756");
        assert_eq!(pairs["timezone"], "Pacific/Auckland");
        assert_eq!(pairs["hourly"], "precipitation");
        assert!(pairs["daily"].contains("weather_code"));
        assert!(pairs["daily"].contains("wind_speed_10m_max"));
        assert!(url.as_str().contains("Pacific%2FAuckland"));
    }

    #[tokio::test]
    async fn fetch_today_parses_observation() {
        let base = spawn_forecast_server(StatusCode::OK, forecast_body(20.0, 9.9, 1, 0.0)).await;
        let obs = client(&base, None).fetch_today().await.unwrap();
        assert_eq!(obs.temperature, 20.0);
        assert_eq!(obs.wind_speed, 9.9);
        assert_eq!(obs.sunniness, 100);
        assert_eq!(obs.rain, 0.0);
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let base = spawn_forecast_server(
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": true, "reason": "maintenance" }),
        )
        .await;
        let err = client(&base, None).fetch_today().await.unwrap_err();
        assert!(err.to_string().contains("error status"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_fetch_error() {
        let base = spawn_forecast_server(StatusCode::OK, serde_json::json!({ "hourly": {} })).await;
        let err = client(&base, None).fetch_today().await.unwrap_err();
        assert!(err.to_string().contains("deserialize"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        // Port 9 (discard) on loopback is not served in the test environment.
        let err = client("http://127.0.0.1:9", None).fetch_today().await.unwrap_err();
        assert!(err.to_string().contains("request failed"));
    }

    #[tokio::test]
    async fn silent_provider_times_out() {
        let base = spawn_silent_server().await;
        let client = ForecastClient::new(
            &base,
            ForecastLocation::default(),
            None,
            Duration::from_millis(200),
        )
        .unwrap();

        let err = tokio::time::timeout(Duration::from_secs(5), client.fetch_today())
            .await
            .expect("fetch must give up on its own")
            .unwrap_err();
        assert!(err.to_string().contains("request failed"));
        let source = err.downcast_ref::<reqwest::Error>().unwrap();
        assert!(source.is_timeout());
    }

    #[tokio::test]
    async fn raw_body_is_dumped_when_configured() {
        let base = spawn_forecast_server(StatusCode::OK, forecast_body(20.0, 5.0, 2, 0.0)).await;
        let dump = tempfile::tempdir().unwrap();

        client(&base, Some(dump.path().to_path_buf()))
            .fetch_today()
            .await
            .unwrap();

        let saved = std::fs::read_dir(dump.path().join("forecast")).unwrap().count();
        assert_eq!(saved, 1);
    }
}
