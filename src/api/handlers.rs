use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::OpenApi;

use super::{
    dto::{DailyRecordDto, EvaluationDto, ObservationDto, RefreshResponse, TodayResponse},
    errors::AppError,
    AppState,
};
use crate::evaluation::{evaluate, DayTier, ThresholdRules};

const DEFAULT_HISTORY_LIMIT: i64 = 7;
const MAX_HISTORY_LIMIT: i64 = 366;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Today's verdict: the cached observation evaluated against the current rules.
///
/// Rules are loaded on every request so that admin edits apply immediately.
/// Before the first fetch completes the observation is `null` and no
/// criteria are met.
#[utoipa::path(
    get,
    path = "/today",
    responses(
        (status = 200, description = "Today's observation and verdict", body = TodayResponse),
        (status = 503, description = "Weather or rules unavailable"),
    ),
    tag = "verdict"
)]
pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodayResponse>, AppError> {
    let snapshot = state.cache.snapshot().await;
    if let Some(failure) = snapshot.failure {
        return Err(AppError::WeatherUnavailable(failure.message));
    }

    let rules = state
        .rules
        .load(&state.fallback)
        .await
        .map_err(AppError::RulesUnavailable)?;

    let evaluation = evaluate(
        snapshot.latest.as_ref().map(|c| &c.observation),
        rules.as_ref(),
    );
    let (observation, fetched_at) = match snapshot.latest {
        Some(c) => (Some(ObservationDto::from(c.observation)), Some(c.fetched_at)),
        None => (None, None),
    };

    Ok(Json(TodayResponse {
        observation,
        fetched_at,
        rules,
        evaluation: evaluation.into(),
    }))
}

/// Fetch, evaluate and persist now instead of waiting for the next tick.
///
/// The refresh runs in its own task, so the daily record is still written
/// if the client goes away mid-request.
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "Refresh completed", body = RefreshResponse),
        (status = 503, description = "Weather or rules unavailable"),
    ),
    tag = "verdict"
)]
pub async fn post_refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let refresher = state.refresher.clone();
    let report = tokio::spawn(async move { refresher.refresh().await })
        .await
        .context("refresh task failed")?
        .map_err(AppError::from_refresh)?;

    Ok(Json(report.into()))
}

/// Effective threshold rules: the saved set, or the configured fallback.
#[utoipa::path(
    get,
    path = "/rules",
    responses(
        (status = 200, description = "Current rules, or null if none are configured", body = Option<ThresholdRules>),
        (status = 503, description = "Rules unavailable"),
    ),
    tag = "rules"
)]
pub async fn get_rules(
    State(state): State<AppState>,
) -> Result<Json<Option<ThresholdRules>>, AppError> {
    let rules = state
        .rules
        .load(&state.fallback)
        .await
        .map_err(AppError::RulesUnavailable)?;
    Ok(Json(rules))
}

/// Replace all four threshold rules.
#[utoipa::path(
    put,
    path = "/rules",
    request_body = ThresholdRules,
    responses(
        (status = 200, description = "Rules saved", body = ThresholdRules),
        (status = 422, description = "Malformed rule set"),
        (status = 500, description = "Rules could not be saved"),
    ),
    tag = "rules"
)]
pub async fn put_rules(
    State(state): State<AppState>,
    Json(rules): Json<ThresholdRules>,
) -> Result<Json<ThresholdRules>, AppError> {
    state
        .rules
        .save(&rules)
        .await
        .map_err(AppError::RulesSaveFailed)?;

    info!(
        min_temp = rules.min_temp,
        max_wind = rules.max_wind,
        min_sunniness = rules.min_sunniness,
        max_rain = rules.max_rain,
        "Threshold rules updated"
    );
    Ok(Json(rules))
}

/// Most recent daily records, newest first. `limit` defaults to 7 and is
/// clamped to 1..=366.
#[utoipa::path(
    get,
    path = "/history",
    params(
        ("limit" = Option<i64>, Query, description = "Number of days to return"),
    ),
    responses(
        (status = 200, description = "Daily records", body = Vec<DailyRecordDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "history"
)]
pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DailyRecordDto>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let rows = state.records.recent(limit).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// The daily record for one date, or `null` if none was written.
#[utoipa::path(
    get,
    path = "/history/{date}",
    params(
        ("date" = NaiveDate, Path, description = "Calendar date (YYYY-MM-DD)"),
    ),
    responses(
        (status = 200, description = "Daily record", body = Option<DailyRecordDto>),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "history"
)]
pub async fn get_history_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Option<DailyRecordDto>>, AppError> {
    let row = state.records.find(date).await?;
    Ok(Json(row.map(Into::into)))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(get_today, post_refresh, get_rules, put_rules, get_history, get_history_day, health),
    components(schemas(
        TodayResponse,
        RefreshResponse,
        ObservationDto,
        EvaluationDto,
        DailyRecordDto,
        ThresholdRules,
        DayTier,
    )),
    tags(
        (name = "verdict", description = "Today's good-day verdict"),
        (name = "rules",   description = "Threshold rule administration"),
        (name = "history", description = "Past daily verdicts"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Can You Beat Wellington API",
        version = "0.1.0",
        description = "Daily good-day verdict for Wellington weather"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
