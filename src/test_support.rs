//! Fixtures shared by unit tests: a local stand-in for the forecast provider
//! and in-memory store implementations.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::{
    db::models::DailyWeatherRecord,
    evaluation::ThresholdRules,
    history::{RecordStore, UpsertOutcome},
    rules::RulesStore,
};

pub const TODAY: &str = "2026-01-15";

/// Open-Meteo shaped body whose reduced observation is exactly
/// `{temperature, wind_speed, sunniness(weather_code), rain}` for [`TODAY`].
pub fn forecast_body(temperature: f64, wind_speed: f64, weather_code: i32, rain: f64) -> Value {
    let mut hourly = vec![0.0; 24];
    hourly[12] = rain;
    json!({
        "latitude": -41.25,
        "longitude": 174.75,
        "timezone": "Pacific/Auckland",
        "daily": {
            "time": [TODAY],
            "weather_code": [weather_code],
            "temperature_2m_max": [temperature],
            "temperature_2m_min": [temperature],
            "wind_speed_10m_max": [wind_speed],
            "precipitation_sum": [rain]
        },
        "hourly": { "precipitation": hourly }
    })
}

// ---------------------------------------------------------------------------
// Fake forecast provider
// ---------------------------------------------------------------------------

/// Serves `GET /v1/forecast` on loopback with a swappable canned response.
#[derive(Clone)]
pub struct FakeForecast {
    pub base_url: String,
    response: Arc<Mutex<(StatusCode, Value)>>,
}

impl FakeForecast {
    pub async fn start(status: StatusCode, body: Value) -> Self {
        let response = Arc::new(Mutex::new((status, body)));
        let shared = response.clone();

        let app = Router::new().route(
            "/v1/forecast",
            get(move || {
                let (status, body) = shared.lock().unwrap().clone();
                async move { (status, Json(body)) }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            base_url: format!("http://{addr}"),
            response,
        }
    }

    pub fn respond(&self, status: StatusCode, body: Value) {
        *self.response.lock().unwrap() = (status, body);
    }
}

/// Start a fake provider and return only its base URL.
pub async fn spawn_forecast_server(status: StatusCode, body: Value) -> String {
    FakeForecast::start(status, body).await.base_url
}

/// Accept connections on loopback and never write a byte back. Accepted
/// sockets are held open for the lifetime of the listener task.
pub async fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRulesStore {
    rules: Mutex<Option<ThresholdRules>>,
    broken: AtomicBool,
}

impl MemoryRulesStore {
    pub fn with(rules: ThresholdRules) -> Self {
        Self {
            rules: Mutex::new(Some(rules)),
            broken: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail.
    pub fn break_storage(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(anyhow!("rules storage unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RulesStore for MemoryRulesStore {
    async fn fetch(&self) -> Result<Option<ThresholdRules>> {
        self.check()?;
        Ok(*self.rules.lock().unwrap())
    }

    async fn save(&self, rules: &ThresholdRules) -> Result<()> {
        self.check()?;
        *self.rules.lock().unwrap() = Some(*rules);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    rows: Mutex<BTreeMap<NaiveDate, DailyWeatherRecord>>,
    broken: AtomicBool,
}

impl MemoryRecordStore {
    pub fn break_storage(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<DailyWeatherRecord> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, record: &DailyWeatherRecord) -> Result<UpsertOutcome> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(anyhow!("record storage unavailable"));
        }
        let previous = self
            .rows
            .lock()
            .unwrap()
            .insert(record.date, record.clone());
        Ok(UpsertOutcome {
            record: record.clone(),
            inserted: previous.is_none(),
        })
    }

    async fn find(&self, date: NaiveDate) -> Result<Option<DailyWeatherRecord>> {
        Ok(self.rows.lock().unwrap().get(&date).cloned())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<DailyWeatherRecord>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
