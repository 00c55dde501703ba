use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{sync::Mutex, time};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    db::models::DailyWeatherRecord,
    evaluation::{evaluate, DailyObservation, EvaluationResult, ThresholdRules},
    forecast::ForecastClient,
    history::{RecordStore, UpsertOutcome},
    observation_cache::ObservationCache,
    rules::{RulesFallback, RulesStore},
};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("weather unavailable: {0:#}")]
    Forecast(anyhow::Error),
    #[error("rules unavailable: {0:#}")]
    Rules(anyhow::Error),
}

/// What one refresh produced.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub observation: DailyObservation,
    /// `None` when no rules are saved and the fallback policy is `Absent`.
    pub rules: Option<ThresholdRules>,
    pub evaluation: EvaluationResult,
    /// `None` when the daily record was not written (no rules, or the write
    /// failed). A failed write never fails the refresh.
    pub persisted: Option<UpsertOutcome>,
}

/// Fetch → cache → evaluate → persist, once per call.
///
/// Calls are serialised: a refresh triggered while another is in flight
/// waits for it, so there is a single writer of the cache and the history.
pub struct RefreshService {
    forecast: ForecastClient,
    rules: Arc<dyn RulesStore>,
    records: Arc<dyn RecordStore>,
    cache: ObservationCache,
    fallback: RulesFallback,
    running: Mutex<()>,
}

impl RefreshService {
    pub fn new(
        forecast: ForecastClient,
        rules: Arc<dyn RulesStore>,
        records: Arc<dyn RecordStore>,
        cache: ObservationCache,
        fallback: RulesFallback,
    ) -> Self {
        Self {
            forecast,
            rules,
            records,
            cache,
            fallback,
            running: Mutex::new(()),
        }
    }

    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let _running = self.running.lock().await;
        let run_id = Uuid::new_v4();

        self.refresh_once()
            .instrument(info_span!("refresh", run_id = %run_id))
            .await
    }

    async fn refresh_once(&self) -> Result<RefreshReport, RefreshError> {
        let observation = match self.forecast.fetch_today().await {
            Ok(obs) => obs,
            Err(e) => {
                self.cache.record_failure(format!("{e:#}")).await;
                return Err(RefreshError::Forecast(e));
            }
        };
        self.cache.record_success(observation.clone()).await;

        let rules = self
            .rules
            .load(&self.fallback)
            .await
            .map_err(RefreshError::Rules)?;

        let evaluation = evaluate(Some(&observation), rules.as_ref());
        info!(
            date = %observation.date,
            criteria_met = evaluation.criteria_met,
            is_good_day = evaluation.is_good_day,
            "Day evaluated"
        );

        let persisted = if rules.is_some() {
            let record = DailyWeatherRecord::new(&observation, &evaluation);
            match self.records.upsert(&record).await {
                Ok(outcome) => {
                    info!(date = %record.date, inserted = outcome.inserted, "Daily record persisted");
                    Some(outcome)
                }
                Err(e) => {
                    error!(date = %record.date, error = %format!("{e:#}"), "Failed to persist daily record");
                    None
                }
            }
        } else {
            warn!(date = %observation.date, "No threshold rules configured; daily record not written");
            None
        };

        Ok(RefreshReport {
            observation,
            rules,
            evaluation,
            persisted,
        })
    }

    /// Refresh every `interval`, starting immediately. Runs until the task is
    /// dropped; spawn this via `tokio::spawn`.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "Refresh loop started");
        let mut ticker = time::interval(interval);

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                error!(error = %e, "Scheduled refresh failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::{
        config::ForecastLocation,
        evaluation::DayTier,
        test_support::{
            forecast_body, spawn_silent_server, FakeForecast, MemoryRecordStore, MemoryRulesStore,
        },
    };

    struct Harness {
        service: RefreshService,
        provider: FakeForecast,
        rules: Arc<MemoryRulesStore>,
        records: Arc<MemoryRecordStore>,
        cache: ObservationCache,
    }

    async fn harness(rules: MemoryRulesStore, fallback: RulesFallback) -> Harness {
        let provider = FakeForecast::start(StatusCode::OK, forecast_body(20.0, 9.9, 1, 0.0)).await;
        let rules = Arc::new(rules);
        let records = Arc::new(MemoryRecordStore::default());
        let cache = ObservationCache::new();
        let service = RefreshService::new(
            ForecastClient::new(
                &provider.base_url,
                ForecastLocation::default(),
                None,
                Duration::from_secs(5),
            )
            .unwrap(),
            rules.clone(),
            records.clone(),
            cache.clone(),
            fallback,
        );
        Harness { service, provider, rules, records, cache }
    }

    fn defaults() -> RulesFallback {
        RulesFallback::Defaults(ThresholdRules::default())
    }

    #[tokio::test]
    async fn good_day_is_cached_and_persisted() {
        let h = harness(MemoryRulesStore::default(), defaults()).await;

        let report = h.service.refresh().await.unwrap();
        assert!(report.evaluation.is_good_day);
        assert_eq!(report.rules, Some(ThresholdRules::default()));
        assert!(report.persisted.as_ref().unwrap().inserted);

        let rows = h.records.rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_good_day);
        assert_eq!(rows[0].temperature, 20.0);

        let snap = h.cache.snapshot().await;
        assert_eq!(snap.latest.unwrap().observation, report.observation);
    }

    #[tokio::test]
    async fn second_refresh_same_day_updates_record() {
        let h = harness(MemoryRulesStore::default(), defaults()).await;
        h.service.refresh().await.unwrap();

        h.provider.respond(StatusCode::OK, forecast_body(20.0, 10.0, 1, 0.0));
        let report = h.service.refresh().await.unwrap();

        assert_eq!(report.evaluation.tier, DayTier::SoClose);
        assert!(!report.persisted.unwrap().inserted);
        let rows = h.records.rows();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_good_day);
        assert_eq!(rows[0].wind_speed, 10.0);
    }

    #[tokio::test]
    async fn fetch_failure_is_recorded_and_nothing_persisted() {
        let h = harness(MemoryRulesStore::default(), defaults()).await;
        h.provider
            .respond(StatusCode::BAD_GATEWAY, serde_json::json!({ "reason": "upstream" }));

        let err = h.service.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Forecast(_)));
        assert!(err.to_string().starts_with("weather unavailable"));
        assert!(h.cache.snapshot().await.failure.is_some());
        assert!(h.records.rows().is_empty());
    }

    #[tokio::test]
    async fn rules_failure_keeps_observation_but_skips_persist() {
        let h = harness(MemoryRulesStore::default(), defaults()).await;
        h.rules.break_storage();

        let err = h.service.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Rules(_)));
        assert!(h.cache.snapshot().await.latest.is_some());
        assert!(h.records.rows().is_empty());
    }

    #[tokio::test]
    async fn persist_failure_does_not_fail_refresh() {
        let h = harness(MemoryRulesStore::default(), defaults()).await;
        h.records.break_storage();

        let report = h.service.refresh().await.unwrap();
        assert!(report.evaluation.is_good_day);
        assert!(report.persisted.is_none());
    }

    #[tokio::test]
    async fn absent_rules_evaluate_to_nothing_and_skip_persist() {
        let h = harness(MemoryRulesStore::default(), RulesFallback::Absent).await;

        let report = h.service.refresh().await.unwrap();
        assert_eq!(report.rules, None);
        assert_eq!(report.evaluation.criteria_met, 0);
        assert!(report.persisted.is_none());
        assert!(h.records.rows().is_empty());
    }

    #[tokio::test]
    async fn saved_rules_take_precedence_over_fallback() {
        let strict = ThresholdRules { min_temp: 25.0, ..ThresholdRules::default() };
        let h = harness(MemoryRulesStore::with(strict), defaults()).await;

        let report = h.service.refresh().await.unwrap();
        assert_eq!(report.rules, Some(strict));
        assert!(!report.evaluation.temperature_ok);
        assert_eq!(report.evaluation.criteria_met, 3);
    }

    #[tokio::test]
    async fn recovery_after_failure_clears_it() {
        let h = harness(MemoryRulesStore::default(), defaults()).await;
        h.provider.respond(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({}));
        h.service.refresh().await.unwrap_err();

        h.provider.respond(StatusCode::OK, forecast_body(19.0, 3.0, 0, 0.0));
        h.service.refresh().await.unwrap();
        assert!(h.cache.snapshot().await.failure.is_none());
    }

    #[tokio::test]
    async fn hung_provider_fails_refresh_and_frees_the_next_one() {
        let base = spawn_silent_server().await;
        let records = Arc::new(MemoryRecordStore::default());
        let cache = ObservationCache::new();
        let service = Arc::new(RefreshService::new(
            ForecastClient::new(
                &base,
                ForecastLocation::default(),
                None,
                Duration::from_millis(200),
            )
            .unwrap(),
            Arc::new(MemoryRulesStore::default()),
            records.clone(),
            cache.clone(),
            defaults(),
        ));

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.refresh().await }
        });
        let second = time::timeout(Duration::from_secs(5), service.refresh())
            .await
            .expect("second refresh must not wait forever behind a hung fetch");
        assert!(matches!(second, Err(RefreshError::Forecast(_))));

        let first = first.await.unwrap();
        assert!(matches!(first, Err(RefreshError::Forecast(_))));

        let failure = cache.snapshot().await.failure.unwrap();
        assert!(failure.message.contains("request failed"));
        assert!(records.rows().is_empty());
    }
}
