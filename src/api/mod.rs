pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{
    forecast::ForecastClient,
    history::RecordStore,
    observation_cache::ObservationCache,
    refresh::RefreshService,
    rules::{RulesFallback, RulesStore},
};

/// Shared handler state. Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub cache: ObservationCache,
    pub rules: Arc<dyn RulesStore>,
    pub records: Arc<dyn RecordStore>,
    pub refresher: Arc<RefreshService>,
    pub fallback: RulesFallback,
}

impl AppState {
    /// Wire a refresh service around the given collaborators, sharing one
    /// observation cache between it and the handlers.
    pub fn new(
        forecast: ForecastClient,
        rules: Arc<dyn RulesStore>,
        records: Arc<dyn RecordStore>,
        fallback: RulesFallback,
    ) -> Self {
        let cache = ObservationCache::new();
        let refresher = Arc::new(RefreshService::new(
            forecast,
            rules.clone(),
            records.clone(),
            cache.clone(),
            fallback.clone(),
        ));

        Self {
            cache,
            rules,
            records,
            refresher,
            fallback,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/today", get(handlers::get_today))
        .route("/refresh", post(handlers::post_refresh))
        .route("/rules", get(handlers::get_rules).put(handlers::put_rules))
        .route("/history", get(handlers::get_history))
        .route("/history/{date}", get(handlers::get_history_day))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
