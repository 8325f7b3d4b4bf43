//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a `{"detail": "..."}` JSON response with an appropriate status code.
//!
//! Client-facing messages for the catalog endpoints are fixed strings that
//! existing clients match on; see the `*_MESSAGE` constants. Internal errors
//! are logged with full detail but only a generic message is returned.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use obras_core::CsvImportError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::export::ExportError;

pub const OBRA_NOT_FOUND_MESSAGE: &str = "Obra não encontrada!";
pub const CSV_MALFORMED_MESSAGE: &str = "CSV mal formatado!";
pub const NOTHING_TO_EXPORT_MESSAGE: &str = "Nenhuma obra para exportar!";

/// All errors that can occur in the obras-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent a request the server cannot act on.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body or parameters failed schema validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request body exceeded the configured limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// An uploaded CSV was rejected.
    #[error("csv import rejected: {0}")]
    CsvImport(#[from] CsvImportError),

    /// Writing or staging a CSV export failed.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
            ServerError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.clone()),
            ServerError::CsvImport(e) => {
                warn!(error = %e, "rejecting csv upload");
                (StatusCode::BAD_REQUEST, CSV_MALFORMED_MESSAGE.to_owned())
            }

            // Internal errors: log the full detail, return a generic message.
            ServerError::Export(e) => {
                error!(error = %e, "csv export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "detail": client_message }))).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(rejection.body_text())
        } else {
            ServerError::Validation(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ServerError {
    fn from(rejection: MultipartRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(e.body_text())
        } else {
            ServerError::BadRequest(format!("failed to read multipart body: {}", e.body_text()))
        }
    }
}
