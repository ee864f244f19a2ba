//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::pipeline::PipelineError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    /// Present only for malformed-generation failures: the exact text the
    /// model produced, for manual review or prompt tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
///
/// Three failure classes stay distinct on the wire: not-found (404),
/// bad request (400), and upstream generation failure (502).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Patient not found: {0}")]
    PatientNotFound(i64),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Clinical text is empty")]
    EmptyInput,
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),
    #[error("Generation backend failure: {0}")]
    GenerationUnavailable(String),
    #[error("Malformed generation response")]
    MalformedGeneration { reason: String, raw_response: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut raw_response = None;

        let (status, code, message) = match &self {
            ApiError::PatientNotFound(id) => (
                StatusCode::NOT_FOUND,
                "PATIENT_NOT_FOUND",
                format!("Patient {id} not found"),
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::EmptyInput => (
                StatusCode::BAD_REQUEST,
                "EMPTY_INPUT",
                "No clinical text available for this patient".to_string(),
            ),
            ApiError::UnreadableDocument(detail) => (
                StatusCode::BAD_REQUEST,
                "UNREADABLE_DOCUMENT",
                detail.clone(),
            ),
            ApiError::GenerationUnavailable(detail) => (
                StatusCode::BAD_GATEWAY,
                "GENERATION_UNAVAILABLE",
                detail.clone(),
            ),
            ApiError::MalformedGeneration {
                reason,
                raw_response: raw,
            } => {
                raw_response = Some(raw.clone());
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_GENERATION",
                    reason.clone(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
            raw_response,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::PatientNotFound(id) => ApiError::PatientNotFound(id),
            PipelineError::EmptyInput => ApiError::EmptyInput,
            PipelineError::UnreadableDocument(detail) => ApiError::UnreadableDocument(detail),
            PipelineError::GenerationUnavailable(detail) => {
                ApiError::GenerationUnavailable(detail)
            }
            PipelineError::BackendRejected { status, body } => ApiError::GenerationUnavailable(
                format!("backend rejected the request (status {status}): {body}"),
            ),
            PipelineError::MalformedGeneration {
                reason,
                raw_response,
            } => ApiError::MalformedGeneration {
                reason,
                raw_response,
            },
            PipelineError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn patient_not_found_returns_404() {
        let response = ApiError::PatientNotFound(7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "PATIENT_NOT_FOUND");
        assert!(json.get("raw_response").is_none());
    }

    #[tokio::test]
    async fn empty_input_returns_400() {
        let response = ApiError::EmptyInput.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "EMPTY_INPUT");
    }

    #[tokio::test]
    async fn generation_unavailable_returns_502() {
        let response = ApiError::GenerationUnavailable("timeout".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn malformed_generation_exposes_raw_response() {
        let response = ApiError::MalformedGeneration {
            reason: "not valid JSON".into(),
            raw_response: "Sorry, I cannot help.".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "MALFORMED_GENERATION");
        assert_eq!(json["raw_response"], "Sorry, I cannot help.");
    }

    #[tokio::test]
    async fn internal_hides_details_from_client() {
        let response = ApiError::Internal("db exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn backend_rejection_maps_to_upstream_class() {
        let api_err: ApiError = PipelineError::BackendRejected {
            status: 429,
            body: "rate limited".into(),
        }
        .into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
