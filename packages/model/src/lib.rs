pub mod classes;
pub mod classifier;
pub mod error;
pub mod handle;
pub mod prediction;

pub use classes::{ClassSet, DEFAULT_CLASSES};
pub use classifier::{Classifier, OnnxClassifier};
pub use error::{InferenceError, ModelError, PredictError};
pub use handle::{ModelHandle, ModelStatus};
pub use prediction::PredictionResult;
