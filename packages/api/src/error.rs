use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use signsos_landmarks::{TypeMismatch, ValidationError};
use signsos_model::PredictError;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: &'static str,
    public_message: Option<String>,
    details: Option<Value>,
    report_policy: ReportPolicy,
}

impl ApiError {
    fn new(
        status: StatusCode,
        public_code: &'static str,
        public_message: Option<String>,
        report_policy: ReportPolicy,
    ) -> Self {
        Self {
            status,
            public_code,
            public_message,
            details: None,
            report_policy,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.public_code
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            None,
            ReportPolicy::Report,
        )
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::debug!("Not found: {}", msg);
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn invalid_json(err: serde_json::Error) -> Self {
        tracing::warn!("Invalid JSON body: {}", err);
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_JSON",
            Some("Invalid JSON body".to_string()),
            ReportPolicy::Ignore,
        )
        .with_details(json!({ "reason": err.to_string() }))
    }

    pub fn invalid_type(mismatch: TypeMismatch) -> Self {
        tracing::warn!("Bad request: {}", mismatch);
        let error = Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_TYPE",
            Some(mismatch.to_string()),
            ReportPolicy::Ignore,
        );
        match mismatch {
            TypeMismatch::NotAList => error,
            TypeMismatch::NonNumeric { index } | TypeMismatch::NonFinite { index } => {
                error.with_details(json!({ "index": index }))
            }
        }
    }

    pub fn invalid_length(received: usize) -> Self {
        tracing::warn!("Bad request: invalid landmark length {}", received);
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_LENGTH",
            Some("Invalid landmark length".to_string()),
            ReportPolicy::Ignore,
        )
        .with_details(json!({
            "expected": ValidationError::EXPECTED_LENGTHS,
            "received": received,
        }))
    }

    pub fn model_unavailable(model_path: &Path) -> Self {
        tracing::warn!(path = %model_path.display(), "Prediction requested but model is not loaded");
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            Some("Model is not loaded".to_string()),
            ReportPolicy::Ignore,
        )
        .with_details(json!({
            "model_path": model_path.display().to_string(),
            "hint": "Train first, then restart server",
        }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            error: ErrorBody<'a>,
        }

        #[derive(Serialize)]
        struct ErrorBody<'a> {
            code: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<&'a str>,
            message: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<&'a Value>,
        }

        let public_message = self
            .public_message
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or("Error"));

        let error_id = match self.report_policy {
            ReportPolicy::Report => Some(uuid::Uuid::new_v4().to_string()),
            ReportPolicy::Ignore => None,
        };

        let mut response = (
            self.status,
            Json(ErrorEnvelope {
                error: ErrorBody {
                    code: self.public_code,
                    id: error_id.as_deref(),
                    message: public_message,
                    details: self.details.as_ref(),
                },
            }),
        )
            .into_response();

        if let Some(id) = error_id.as_deref()
            && let Ok(v) = HeaderValue::from_str(id)
        {
            response.headers_mut().insert("x-error-id", v);
        }

        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidType(mismatch) => Self::invalid_type(mismatch),
            ValidationError::InvalidLength { received } => Self::invalid_length(received),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Invalid(validation) => validation.into(),
            // Handlers check availability up front and know the artifact path.
            PredictError::Unavailable => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                Some("Model is not loaded".to_string()),
                ReportPolicy::Ignore,
            ),
            PredictError::Inference(e) => Self::internal(format!("Inference failed: {e}")),
        }
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.public_code)
    }
}
