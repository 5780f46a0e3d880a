//! Classifier backends.

use std::path::Path;

use signsos_landmarks::{FEATURE_LEN, LandmarkVector};
use tract_onnx::prelude::*;

use crate::error::{InferenceError, ModelError};

/// Scores every configured class for one landmark vector.
///
/// Implementations are shared read-only between concurrent requests, so
/// `score` takes `&self` and must not rely on interior mutation.
pub trait Classifier: Send + Sync {
    /// Width of the score vector, when the backend knows it before running.
    fn num_classes(&self) -> Option<usize>;

    fn score(&self, input: &LandmarkVector) -> Result<Vec<f32>, InferenceError>;
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// An ONNX model executed with tract on the CPU.
///
/// The input is fixed to `f32[1, 126]`; the first output is read as the
/// per-class score vector.
pub struct OnnxClassifier {
    plan: Plan,
    num_classes: Option<usize>,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, FEATURE_LEN]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ModelError::Load {
                path: path.to_path_buf(),
                message: format!("{e:#}"),
            })?;

        let num_classes = plan
            .model()
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().and_then(|dims| dims.last().copied()));

        tracing::debug!(path = %path.display(), ?num_classes, "onnx plan ready");
        Ok(Self { plan, num_classes })
    }
}

impl Classifier for OnnxClassifier {
    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn score(&self, input: &LandmarkVector) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_shape(&[1, FEATURE_LEN], input.as_slice())
            .map_err(|e| InferenceError::new(format!("failed to build input tensor: {e}")))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::new(format!("{e:#}")))?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::new("model produced no outputs"))?;
        let scores = first
            .as_slice::<f32>()
            .map_err(|e| InferenceError::new(format!("unexpected output type: {e}")))?;

        Ok(scores.to_vec())
    }
}
