use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::classes::ClassSet;
use crate::error::InferenceError;

/// A labeled, ranked classifier output for one landmark vector.
///
/// `label` is always the arg-max of `scores` and `confidence` its score.
/// Ties resolve to the class that comes first in the [`ClassSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    label: String,
    confidence: f32,
    scores: Vec<(String, f32)>,
}

impl PredictionResult {
    /// Pairs raw classifier scores with their class labels.
    pub fn from_scores(classes: &ClassSet, raw: Vec<f32>) -> Result<Self, InferenceError> {
        if raw.len() != classes.len() {
            return Err(InferenceError::new(format!(
                "classifier returned {} scores for {} classes",
                raw.len(),
                classes.len()
            )));
        }
        if raw.iter().any(|s| !s.is_finite()) {
            return Err(InferenceError::new("classifier returned a non-finite score"));
        }

        let probabilities = if raw.iter().all(|s| (0.0..=1.0).contains(s)) {
            raw
        } else {
            tracing::debug!("scores outside [0, 1], applying softmax");
            softmax(&raw)
        };

        let mut best = 0;
        for (i, score) in probabilities.iter().enumerate() {
            if *score > probabilities[best] {
                best = i;
            }
        }

        let scores: Vec<(String, f32)> = classes
            .iter()
            .map(str::to_string)
            .zip(probabilities)
            .collect();
        let (label, confidence) = scores[best].clone();

        Ok(Self {
            label,
            confidence,
            scores,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Scores in class order.
    pub fn scores(&self) -> &[(String, f32)] {
        &self.scores
    }

    pub fn score(&self, label: &str) -> Option<f32> {
        self.scores
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, score)| *score)
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

struct ScoreMap<'a>(&'a [(String, f32)]);

impl Serialize for ScoreMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, score) in self.0 {
            map.serialize_entry(label, score)?;
        }
        map.end()
    }
}

impl Serialize for PredictionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PredictionResult", 3)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("scores", &ScoreMap(&self.scores))?;
        state.end()
    }
}
