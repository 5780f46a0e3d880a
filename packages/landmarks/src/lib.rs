//! Hand landmark captures and the fixed-length feature vector the gesture
//! classifier consumes.

pub mod capture;
pub mod vector;

pub use capture::{Capture, HAND_LANDMARKS, Hand, Landmark};
pub use vector::{
    FEATURE_LEN, LandmarkVector, ONE_HAND_LEN, TypeMismatch, ValidationError, encode,
};
