//! The HTTP client and label notifier against real local servers.

use axum::{Json, Router, routing::post};
use serde_json::{Value, json};
use signsos_api::{construct_router, state::State};
use signsos_capture::{ApiClient, ClientError, Notifier, NotifyOutcome, PredictionService};
use signsos_landmarks::LandmarkVector;
use signsos_model::{ClassSet, Classifier, InferenceError, ModelHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct HelloClassifier;

impl Classifier for HelloClassifier {
    fn num_classes(&self) -> Option<usize> {
        Some(4)
    }

    fn score(&self, _input: &LandmarkVector) -> Result<Vec<f32>, InferenceError> {
        Ok(vec![0.02, 0.03, 0.02, 0.93])
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

async fn prediction_server(loaded: bool) -> String {
    let handle = if loaded {
        ModelHandle::loaded(
            "models/hand_sign_model.onnx",
            ClassSet::default(),
            Arc::new(HelloClassifier),
        )
        .unwrap()
    } else {
        ModelHandle::unloaded("models/hand_sign_model.onnx", ClassSet::default())
    };
    serve(construct_router(Arc::new(State::new(handle)))).await
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn health_and_predict() {
    let base = prediction_server(true).await;
    let client = client(&format!("{base}/"));

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.model_loaded);
    assert_eq!(health.classes, ["help", "cannot", "speak", "hello"]);

    let prediction = client.predict(vec![0.1; 63]).await.unwrap();
    assert_eq!(prediction.label, "hello");
    assert!((prediction.confidence - 0.93).abs() < 1e-6);
    assert_eq!(prediction.scores.len(), 4);
}

#[tokio::test]
async fn rejected_payload_carries_the_error_code() {
    let base = prediction_server(true).await;
    let err = client(&base).predict(vec![0.1; 50]).await.unwrap_err();

    match err {
        ClientError::Response { status, code, .. } => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("INVALID_LENGTH"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client(&base).predict(vec![0.1; 50]).await.unwrap_err().is_transient());
}

#[tokio::test]
async fn unloaded_server_answers_503() {
    let base = prediction_server(false).await;
    let client = client(&base);

    assert!(!client.health().await.unwrap().model_loaded);
    let err = client.predict(vec![0.0; 126]).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Response { status: 503, ref code, .. } if code.as_deref() == Some("SERVICE_UNAVAILABLE")
    ));
}

#[tokio::test]
async fn unreachable_server_is_transient() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}")).health().await.unwrap_err();
    assert!(err.is_transient(), "{err:?}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let app = Router::new().route(
        "/predict",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let base = serve(app).await;
    let client = ApiClient::new(&base, Duration::from_millis(100)).unwrap();

    assert_eq!(
        client.predict(vec![0.0; 63]).await.unwrap_err(),
        ClientError::Timeout
    );
}

#[derive(Clone, Default)]
struct AudioBackend {
    received: Arc<Mutex<Vec<Value>>>,
    fail_next: Arc<AtomicUsize>,
}

async fn audio_backend() -> (String, AudioBackend) {
    let backend = AudioBackend::default();
    let state = backend.clone();
    let app = Router::new().route(
        "/generate-audio",
        post(move |Json(body): Json<Value>| {
            let state = state.clone();
            async move {
                if state.fail_next.load(Ordering::SeqCst) > 0 {
                    state.fail_next.fetch_sub(1, Ordering::SeqCst);
                    return (
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "tts down" })),
                    );
                }
                let text = body["text"].as_str().unwrap_or_default().to_string();
                state.received.lock().unwrap().push(body);
                (
                    axum::http::StatusCode::OK,
                    Json(json!({ "audioUrl": format!("https://audio.test/{text}.mp3") })),
                )
            }
        }),
    );
    let base = serve(app).await;
    (format!("{base}/generate-audio"), backend)
}

#[tokio::test]
async fn notifier_posts_each_new_label_once() {
    let (url, backend) = audio_backend().await;
    let notifier = Notifier::new(url, "demo-user", 0.85, Duration::from_secs(2)).unwrap();

    assert_eq!(notifier.notify("hello", 0.5).await.unwrap(), NotifyOutcome::Skipped);
    assert_eq!(
        notifier.notify("hello", 0.9).await.unwrap(),
        NotifyOutcome::Sent {
            audio_url: Some("https://audio.test/hello.mp3".into())
        }
    );
    assert_eq!(notifier.notify("hello", 0.99).await.unwrap(), NotifyOutcome::Skipped);
    assert!(matches!(
        notifier.notify("help", 0.85).await.unwrap(),
        NotifyOutcome::Sent { .. }
    ));

    let received = backend.received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![
            json!({ "text": "hello", "userId": "demo-user" }),
            json!({ "text": "help", "userId": "demo-user" }),
        ]
    );
}

#[tokio::test]
async fn failed_post_is_retried_for_the_same_label() {
    let (url, backend) = audio_backend().await;
    backend.fail_next.store(1, Ordering::SeqCst);
    let notifier = Notifier::new(url, "demo-user", 0.85, Duration::from_secs(2)).unwrap();

    assert!(notifier.notify("speak", 0.9).await.is_err());
    assert!(matches!(
        notifier.notify("speak", 0.9).await.unwrap(),
        NotifyOutcome::Sent { .. }
    ));
    assert_eq!(backend.received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn rapid_offers_keep_one_post_pending() {
    let posts = Arc::new(AtomicUsize::new(0));
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/generate-audio",
        post({
            let (posts, active, max_active) = (posts.clone(), active.clone(), max_active.clone());
            move || {
                let (posts, active, max_active) =
                    (posts.clone(), active.clone(), max_active.clone());
                async move {
                    posts.fetch_add(1, Ordering::SeqCst);
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    (
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "tts down" })),
                    )
                }
            }
        }),
    );
    let url = format!("{}/generate-audio", serve(app).await);
    let notifier =
        Arc::new(Notifier::new(url, "demo-user", 0.85, Duration::from_secs(10)).unwrap());

    assert!(!notifier.offer("hello".into(), 0.5));

    let mut accepted = 0;
    for _ in 0..20 {
        if notifier.offer("hello".into(), 0.95) {
            accepted += 1;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while notifier.is_posting() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let settled = posts.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(posts.load(Ordering::SeqCst), settled, "nothing left queued");
    assert_eq!(settled, accepted);
    assert!(accepted < 20, "offers during a pending post are dropped");
    assert_eq!(max_active.load(Ordering::SeqCst), 1);
}
