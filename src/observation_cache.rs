use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::evaluation::DailyObservation;

/// Most recent successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedObservation {
    pub observation: DailyObservation,
    pub fetched_at: DateTime<Utc>,
}

/// Most recent failed fetch, as surfaced in `weather_unavailable` errors.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub message: String,
}

/// Point-in-time copy of the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    pub latest: Option<CachedObservation>,
    /// Set when the most recent fetch failed; cleared by the next success.
    pub failure: Option<FetchFailure>,
}

/// Today's observation plus the outcome of the last fetch. The refresh
/// service is the only writer; `GET /today` reads it on every request.
///
/// Clones share one snapshot. Handlers only ever take the read lock.
#[derive(Clone, Default)]
pub struct ObservationCache {
    inner: Arc<RwLock<CacheSnapshot>>,
}

impl ObservationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached observation and clear any recorded failure.
    pub async fn record_success(&self, observation: DailyObservation) {
        let mut state = self.inner.write().await;
        state.latest = Some(CachedObservation {
            observation,
            fetched_at: Utc::now(),
        });
        state.failure = None;
    }

    /// Record a failed fetch. The previous observation is kept but callers
    /// must treat the weather as unavailable while `failure` is set.
    pub async fn record_failure(&self, message: impl Into<String>) {
        self.inner.write().await.failure = Some(FetchFailure {
            message: message.into(),
        });
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        self.inner.read().await.clone()
    }
}
