use axum::Router;
use error::ApiError;
use state::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
mod routes;
pub mod state;

pub use axum;
pub use routes::health::HealthResponse;

/// Builds the service router.
///
/// `POST /predict` is canonical; `POST /endpoint` is a deprecated alias bound
/// to the same handler. Unknown paths, and known paths called with the wrong
/// method, answer 404.
pub fn construct_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::predict::routes())
        .fallback(fallback)
        .method_not_allowed_fallback(fallback)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn fallback(uri: axum::http::Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
