use signsos_landmarks::ValidationError;
use std::path::PathBuf;

/// Errors raised while assembling a [`ModelHandle`](crate::ModelHandle).
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("class list is empty")]
    EmptyClasses,
    #[error("duplicate class label '{0}'")]
    DuplicateClass(String),
    #[error("failed to read labels from {}: {source}", .path.display())]
    LabelsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("labels file {} is not a JSON list of strings: {source}", .path.display())]
    LabelsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load model artifact {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },
    #[error(
        "class mismatch: model produces {model} scores but {labels} labels are configured, retrain the model"
    )]
    ClassMismatch { model: usize, labels: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InferenceError(pub String);

impl InferenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced by a single prediction request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("model is not loaded")]
    Unavailable,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}
