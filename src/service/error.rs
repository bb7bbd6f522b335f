use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{foundation::error::PrintError, service::store::DocumentKind};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{} not found", .0.label())]
    NotFound(DocumentKind),

    #[error("Canvas data is missing")]
    MissingInput,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to generate PDF: {0}")]
    GenerationFailed(String),
}

impl From<PrintError> for ServiceError {
    fn from(e: PrintError) -> Self {
        if e.is_caller_error() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::GenerationFailed(e.to_string())
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            Self::MissingInput => (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() })),
            Self::InvalidRequest(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request", "details": details }),
            ),
            Self::GenerationFailed(details) => {
                tracing::error!("PDF generation error: {details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to generate PDF", "details": details }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
