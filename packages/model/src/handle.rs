use serde::Serialize;
use serde_json::Value;
use signsos_landmarks::{LandmarkVector, encode};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classes::ClassSet;
use crate::classifier::{Classifier, OnnxClassifier};
use crate::error::{ModelError, PredictError};
use crate::prediction::PredictionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Loaded,
    Unloaded,
}

/// Process-wide model state, built once at startup and shared read-only.
///
/// A handle never changes state after construction: an artifact that was
/// missing at startup stays missing until the process restarts.
pub struct ModelHandle {
    artifact_path: PathBuf,
    classes: ClassSet,
    classifier: Option<Arc<dyn Classifier>>,
}

impl ModelHandle {
    pub fn unloaded(artifact_path: impl Into<PathBuf>, classes: ClassSet) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            classes,
            classifier: None,
        }
    }

    pub fn loaded(
        artifact_path: impl Into<PathBuf>,
        classes: ClassSet,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ModelError> {
        if let Some(model) = classifier.num_classes()
            && model != classes.len()
        {
            return Err(ModelError::ClassMismatch {
                model,
                labels: classes.len(),
            });
        }

        Ok(Self {
            artifact_path: artifact_path.into(),
            classes,
            classifier: Some(classifier),
        })
    }

    /// Loads the ONNX artifact at `artifact_path`.
    ///
    /// A missing artifact yields an unloaded handle. Labels come from a
    /// `<stem>.labels.json` sidecar when present, else from `fallback`.
    pub fn open(artifact_path: &Path, fallback: ClassSet) -> Result<Self, ModelError> {
        if !artifact_path.exists() {
            tracing::warn!(
                path = %artifact_path.display(),
                "model artifact not found, serving without a model; train first, then restart"
            );
            return Ok(Self::unloaded(artifact_path, fallback));
        }

        let classes = match labels_path(artifact_path) {
            sidecar if sidecar.exists() => {
                tracing::info!(path = %sidecar.display(), "using labels bundled with the model");
                ClassSet::from_labels_file(&sidecar)?
            }
            _ => fallback,
        };

        let classifier = OnnxClassifier::load(artifact_path)?;
        let resolved = std::fs::canonicalize(artifact_path)
            .unwrap_or_else(|_| artifact_path.to_path_buf());

        let handle = Self::loaded(resolved, classes, Arc::new(classifier))?;
        tracing::info!(
            path = %handle.artifact_path.display(),
            classes = ?handle.classes,
            "model loaded"
        );
        Ok(handle)
    }

    pub fn status(&self) -> ModelStatus {
        if self.classifier.is_some() {
            ModelStatus::Loaded
        } else {
            ModelStatus::Unloaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status() == ModelStatus::Loaded
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    /// Runs the full request contract on an untyped `landmarks` payload:
    /// availability first, then validation, then inference.
    pub fn predict_json(&self, raw: &Value) -> Result<PredictionResult, PredictError> {
        if !self.is_loaded() {
            return Err(PredictError::Unavailable);
        }
        let vector = encode(raw)?;
        self.predict(&vector)
    }

    pub fn predict(&self, vector: &LandmarkVector) -> Result<PredictionResult, PredictError> {
        let classifier = self.classifier.as_ref().ok_or(PredictError::Unavailable)?;
        let scores = classifier.score(vector)?;
        Ok(PredictionResult::from_scores(&self.classes, scores)?)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("artifact_path", &self.artifact_path)
            .field("classes", &self.classes)
            .field("status", &self.status())
            .finish()
    }
}

fn labels_path(artifact_path: &Path) -> PathBuf {
    artifact_path.with_extension("labels.json")
}
