use crate::state::AppState;
use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use signsos_model::ClassSet;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_path: String,
    pub classes: ClassSet,
}

/// Liveness plus model status. Never fails, whatever the model state.
#[tracing::instrument(name = "GET /health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.model.is_loaded(),
        model_path: state.model.artifact_path().display().to_string(),
        classes: state.model.classes().clone(),
    })
}
