use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{MatchedPath, State};
use axum::{Json, Router, routing::post};
use serde_json::Value;
use signsos_model::PredictionResult;
use std::time::Instant;

pub const CANONICAL_PATH: &str = "/predict";
pub const DEPRECATED_ALIAS: &str = "/endpoint";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(CANONICAL_PATH, post(predict))
        .route(DEPRECATED_ALIAS, post(predict))
}

/// Expects `{"landmarks": [number, ...]}` with 63 or 126 values.
#[tracing::instrument(name = "POST predict", skip_all, fields(path = %path.as_str()))]
pub async fn predict(
    State(state): State<AppState>,
    path: MatchedPath,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    if path.as_str() == DEPRECATED_ALIAS {
        tracing::debug!("{} is deprecated, use {}", DEPRECATED_ALIAS, CANONICAL_PATH);
    }

    let started = Instant::now();
    let outcome = run_prediction(state, &body).await;

    let label = match &outcome {
        Ok(_) => "ok",
        Err(e) if e.status().is_client_error() => "rejected",
        Err(e) if e.status() == axum::http::StatusCode::SERVICE_UNAVAILABLE => "unavailable",
        Err(_) => "error",
    };
    metrics::counter!("predictions_total", "outcome" => label).increment(1);
    metrics::histogram!("prediction_duration_seconds").record(started.elapsed().as_secs_f64());

    outcome.map(Json)
}

async fn run_prediction(state: AppState, body: &[u8]) -> Result<PredictionResult, ApiError> {
    if !state.model.is_loaded() {
        return Err(ApiError::model_unavailable(state.model.artifact_path()));
    }

    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(ApiError::invalid_json)?
    };
    let landmarks = payload.get("landmarks").cloned().unwrap_or(Value::Null);

    let result = tokio::task::spawn_blocking(move || state.model.predict_json(&landmarks))
        .await
        .map_err(|e| ApiError::internal(format!("Prediction task failed: {e}")))??;

    tracing::debug!(label = result.label(), confidence = result.confidence(), "prediction");
    Ok(result)
}
