//! The capture loop body.
//!
//! A [`Session`] is driven one tick at a time. Each tick harvests a finished
//! request, pulls the newest capture for display and sends it only when it
//! has a valid length, the throttle allows it and nothing is in flight.

use crate::client::{ClientError, Health, Prediction, PredictionService};
use crate::notify::Notifier;
use crate::presenter::{FrameView, ServerStatus, Tier};
use crate::source::{LandmarkSource, SourceError};
use crate::throttle::Throttle;
use signsos_landmarks::{Capture, LandmarkVector, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type InFlight = JoinHandle<Result<Prediction, ClientError>>;
type HealthCheck = JoinHandle<Result<Health, ClientError>>;

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Waiting,
    Predicted(Prediction),
    Failed(ClientError),
}

pub struct Session<S> {
    source: S,
    service: Arc<dyn PredictionService>,
    throttle: Throttle,
    in_flight: Option<InFlight>,
    health_check: Option<HealthCheck>,
    outcome: Outcome,
    server: ServerStatus,
    notifier: Option<Arc<Notifier>>,
}

impl<S: LandmarkSource> Session<S> {
    pub fn new(source: S, service: Arc<dyn PredictionService>, min_interval: Duration) -> Self {
        Self {
            source,
            service,
            throttle: Throttle::new(min_interval),
            in_flight: None,
            health_check: None,
            outcome: Outcome::Waiting,
            server: ServerStatus::Unknown,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn server_status(&self) -> &ServerStatus {
        &self.server
    }

    pub fn is_checking_health(&self) -> bool {
        self.health_check.is_some()
    }

    /// One-shot liveness check. A negative answer is advisory only.
    pub async fn check_health(&mut self) -> &ServerStatus {
        self.server = server_status(self.service.health().await);
        &self.server
    }

    /// Starts a liveness check in the background; a later tick picks up the
    /// answer. Does nothing while a check is already running.
    pub fn request_health_check(&mut self) {
        if self.health_check.is_some() {
            return;
        }
        let service = self.service.clone();
        self.health_check = Some(tokio::spawn(async move { service.health().await }));
    }

    /// Returns `None` once the source has no more captures.
    pub async fn tick(&mut self, now: Instant) -> Result<Option<FrameView>, SourceError> {
        if let Some(handle) = self.in_flight.take_if(|h| h.is_finished()) {
            let result = join(handle).await;
            self.record(result);
        }
        if let Some(handle) = self.health_check.take_if(|h| h.is_finished()) {
            let result = handle.await.unwrap_or_else(|e| {
                Err(ClientError::Transport(format!("health task failed: {e}")))
            });
            self.server = server_status(result);
            tracing::info!(server = ?self.server, "health re-checked");
        }

        let Some(capture) = self.source.next_capture()? else {
            return Ok(None);
        };

        let vector = capture.to_vector();
        let view = self.view(&capture, &vector);

        if capture.hand_count() > 0
            && vector.is_ok()
            && self.in_flight.is_none()
            && self.throttle.ready(now)
        {
            self.throttle.mark(now);
            let service = self.service.clone();
            let landmarks = capture.flatten();
            self.in_flight = Some(tokio::spawn(async move { service.predict(landmarks).await }));
        }

        Ok(Some(view))
    }

    /// Waits for the in-flight request, if any, and records its outcome.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            let result = join(handle).await;
            self.record(result);
        }
    }

    fn record(&mut self, result: Result<Prediction, ClientError>) {
        match result {
            Ok(prediction) => {
                tracing::debug!(
                    label = %prediction.label,
                    confidence = prediction.confidence,
                    "prediction received"
                );
                self.server = ServerStatus::Reachable { model_loaded: true };
                if let Some(notifier) = &self.notifier {
                    notifier.offer(prediction.label.clone(), prediction.confidence);
                }
                self.outcome = Outcome::Predicted(prediction);
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!("prediction request failed, retrying on next frame: {}", e);
                    self.server = ServerStatus::Unreachable(e.to_string());
                } else {
                    tracing::warn!("prediction rejected: {}", e);
                }
                self.outcome = Outcome::Failed(e);
            }
        }
    }

    fn view(
        &self,
        capture: &Capture,
        vector: &Result<LandmarkVector, ValidationError>,
    ) -> FrameView {
        let hands = capture.hand_count();
        let (text, tier, error) = if hands == 0 {
            ("No hands detected".to_string(), Tier::Idle, None)
        } else {
            match vector {
                Err(ValidationError::InvalidLength { received }) => {
                    (format!("Invalid landmarks: {received}"), Tier::Error, None)
                }
                Err(e) => (
                    format!("Invalid landmarks: {}", capture.flatten().len()),
                    Tier::Error,
                    Some(e.to_string()),
                ),
                Ok(_) => match &self.outcome {
                    Outcome::Waiting => ("WAITING (0.0%)".to_string(), Tier::Low, None),
                    Outcome::Predicted(p) => (
                        format!("{} ({:.1}%)", p.label.to_uppercase(), p.confidence * 100.0),
                        Tier::for_confidence(p.confidence),
                        None,
                    ),
                    Outcome::Failed(e) => (
                        "SERVER_ERROR (0.0%)".to_string(),
                        Tier::Error,
                        Some(e.to_string()),
                    ),
                },
            }
        };

        FrameView {
            hands,
            text,
            tier,
            error,
            server: self.server.clone(),
        }
    }
}

fn server_status(result: Result<Health, ClientError>) -> ServerStatus {
    match result {
        Ok(health) => {
            if !health.model_loaded {
                tracing::warn!(
                    model_path = ?health.model_path,
                    "server is up but has no model loaded"
                );
            }
            ServerStatus::Reachable {
                model_loaded: health.model_loaded,
            }
        }
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            ServerStatus::Unreachable(e.to_string())
        }
    }
}

async fn join(handle: InFlight) -> Result<Prediction, ClientError> {
    handle
        .await
        .unwrap_or_else(|e| Err(ClientError::Transport(format!("request task failed: {e}"))))
}
