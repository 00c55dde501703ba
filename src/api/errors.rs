use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::refresh::RefreshError;

/// Handler error. The `kind` in the JSON body lets a front end tell "weather
/// unavailable" apart from "rules unavailable".
#[derive(Debug)]
pub enum AppError {
    /// The last forecast fetch failed.
    WeatherUnavailable(String),
    /// Threshold rules could not be loaded.
    RulesUnavailable(anyhow::Error),
    /// Threshold rules could not be saved.
    RulesSaveFailed(anyhow::Error),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn from_refresh(e: RefreshError) -> Self {
        match e {
            RefreshError::Forecast(e) => Self::WeatherUnavailable(format!("{e:#}")),
            RefreshError::Rules(e) => Self::RulesUnavailable(e),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::WeatherUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "weather_unavailable", msg.clone())
            }
            Self::RulesUnavailable(e) => {
                (StatusCode::SERVICE_UNAVAILABLE, "rules_unavailable", format!("{e:#}"))
            }
            Self::RulesSaveFailed(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "rules_save_failed", format!("{e:#}"))
            }
            Self::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", format!("{e:#}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        tracing::warn!(status = status.as_u16(), kind, error = %message, "Request failed");
        let body = Json(json!({ "error": message, "kind": kind }));
        (status, body).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self::Internal(e.into())
    }
}
