#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::Router;
use signsos_api::{construct_router, state::State};
use signsos_model::ModelHandle;
use std::sync::Arc;

mod config;
mod metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    metrics::init_tracing();

    tracing::info!("Starting SignSOS prediction server");

    let config = config::Config::from_env()?;
    tracing::info!(
        model_path = %config.model_path.display(),
        classes = ?config.classes,
        "Loaded configuration"
    );

    let model = ModelHandle::open(&config.model_path, config.classes.clone())?;
    let state = Arc::new(State::new(model));

    let app = construct_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("POST /predict (or /endpoint) with {{\"landmarks\": [...]}}, GET /health");

    match config.metrics_port {
        Some(metrics_port) => {
            let handle = metrics::init_metrics()?;
            let metrics_app = Router::new().route(
                "/metrics",
                axum::routing::get(move || metrics::handler(handle.clone())),
            );
            let metrics_addr = format!("{}:{}", config.host, metrics_port);
            let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr).await?;
            tracing::info!("Metrics listening on {}", metrics_addr);

            tokio::select! {
                res = axum::serve(listener, app) => res?,
                res = axum::serve(metrics_listener, metrics_app) => res?,
            }
        }
        None => axum::serve(listener, app).await?,
    }

    Ok(())
}
