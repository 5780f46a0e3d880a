use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("prediction_duration_seconds".to_string()),
            &[0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
        )?
        .install_recorder()?;

    metrics::describe_counter!("predictions_total", "Prediction requests by outcome");
    metrics::describe_histogram!(
        "prediction_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent validating and scoring one prediction request"
    );

    tracing::info!("Prometheus metrics initialized");
    Ok(handle)
}

pub async fn handler(handle: PrometheusHandle) -> impl IntoResponse {
    handle.render()
}
