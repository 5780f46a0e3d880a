use serde_json::Value;

/// Flattened length of a single hand: 21 keypoints, three coordinates each.
pub const ONE_HAND_LEN: usize = 63;
/// Model input length: two hands' worth of coordinates.
pub const FEATURE_LEN: usize = 2 * ONE_HAND_LEN;

/// Why a payload failed the numeric check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TypeMismatch {
    #[error("'landmarks' must be a list of numbers")]
    NotAList,
    #[error("'landmarks' must contain only numeric values (element {index} is not a number)")]
    NonNumeric { index: usize },
    #[error("'landmarks' must contain only finite values (element {index} is not finite)")]
    NonFinite { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    InvalidType(#[from] TypeMismatch),
    #[error(
        "Invalid landmark length: expected {one} or {two} values, received {received}",
        one = ONE_HAND_LEN,
        two = FEATURE_LEN
    )]
    InvalidLength { received: usize },
}

impl ValidationError {
    /// Lengths a caller may send.
    pub const EXPECTED_LENGTHS: [usize; 2] = [ONE_HAND_LEN, FEATURE_LEN];
}

/// A validated, zero-padded model input.
///
/// Always exactly [`FEATURE_LEN`] values. A single-hand capture occupies the
/// first [`ONE_HAND_LEN`] slots and the tail is zero; coordinates are never
/// rescaled.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkVector([f32; FEATURE_LEN]);

impl LandmarkVector {
    /// Validates an untyped JSON value as received over the wire.
    pub fn from_json(raw: &Value) -> Result<Self, ValidationError> {
        let items = raw.as_array().ok_or(TypeMismatch::NotAList)?;

        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let number = item
                .as_f64()
                .ok_or(TypeMismatch::NonNumeric { index })?;
            values.push(narrow(number, index)?);
        }

        Self::from_values(&values)
    }

    /// Validates coordinates that are already numeric, e.g. a flattened
    /// [`Capture`](crate::Capture).
    pub fn from_values(values: &[f32]) -> Result<Self, ValidationError> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(TypeMismatch::NonFinite { index }.into());
        }

        let mut padded = [0.0f32; FEATURE_LEN];
        match values.len() {
            ONE_HAND_LEN | FEATURE_LEN => {
                padded[..values.len()].copy_from_slice(values);
                Ok(Self(padded))
            }
            received => Err(ValidationError::InvalidLength { received }),
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

impl AsRef<[f32]> for LandmarkVector {
    fn as_ref(&self) -> &[f32] {
        self.as_slice()
    }
}

/// Encodes a raw wire payload into a model input.
pub fn encode(raw: &Value) -> Result<LandmarkVector, ValidationError> {
    LandmarkVector::from_json(raw)
}

fn narrow(value: f64, index: usize) -> Result<f32, TypeMismatch> {
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(TypeMismatch::NonFinite { index })
    }
}
