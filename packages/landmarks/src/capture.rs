//! Per-frame hand detections as produced by an upstream landmark detector.

use serde::{Deserialize, Serialize};

use crate::vector::{LandmarkVector, ValidationError};

/// Keypoints per detected hand.
pub const HAND_LANDMARKS: usize = 21;

/// A single keypoint. Serialized as an `[x, y, z]` triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(lm: Landmark) -> Self {
        [lm.x, lm.y, lm.z]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    landmarks: [Landmark; HAND_LANDMARKS],
}

impl Hand {
    pub fn new(landmarks: [Landmark; HAND_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    pub fn landmarks(&self) -> &[Landmark; HAND_LANDMARKS] {
        &self.landmarks
    }
}

/// All hands detected in one frame, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub hands: Vec<Hand>,
}

impl Capture {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self { hands }
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    /// Concatenates every hand's `x, y, z` triples in detection order.
    pub fn flatten(&self) -> Vec<f32> {
        self.hands
            .iter()
            .flat_map(|hand| hand.landmarks.iter())
            .flat_map(|lm| [lm.x, lm.y, lm.z])
            .collect()
    }

    pub fn to_vector(&self) -> Result<LandmarkVector, ValidationError> {
        LandmarkVector::from_values(&self.flatten())
    }
}
