// Error taxonomy and shared result alias

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

/// Application-level error, one variant per classification branch.
///
/// Every failure a request can hit maps onto exactly one variant, so the
/// HTTP status and response body are a type match rather than string
/// sniffing on error messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no file field present in the multipart payload")]
    MissingFile,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage configuration error: {0}")]
    Configuration(String),

    #[error("storage provider rejected the request: {0}")]
    Provider(String),

    #[error("storage endpoint unreachable: {0}")]
    Network(String),

    #[error("secret store failure: {0}")]
    SecretStore(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable tag for the classification branch.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingFile => "missing_file",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Configuration(_) => "configuration",
            AppError::Provider(_) => "provider",
            AppError::Network(_) => "network",
            AppError::SecretStore(_) => "secret_store",
            AppError::Internal(_) => "internal",
        }
    }

    /// Human-readable summary shown to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            AppError::MissingFile => "No file uploaded.",
            AppError::InvalidRequest(_) => "Could not read the uploaded form data.",
            AppError::Configuration(_) => {
                "Storage connection string is missing or not correctly formatted."
            }
            AppError::Provider(_) => "The storage provider rejected the upload.",
            AppError::Network(_) => "The storage provider could not be reached.",
            AppError::SecretStore(_) => "Error retrieving secrets from the secret store.",
            AppError::Internal(_) => "Error uploading file.",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            AppError::MissingFile => Some("Please select a file and try again.".to_string()),
            AppError::InvalidRequest(msg)
            | AppError::Configuration(msg)
            | AppError::Provider(msg)
            | AppError::Network(msg)
            | AppError::SecretStore(msg)
            | AppError::Internal(msg) => Some(msg.clone()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Configuration(msg) => AppError::Configuration(msg),
            StorageError::Provider { status, body } => {
                AppError::Provider(format!("HTTP {status}: {body}"))
            }
            StorageError::Network(err) => AppError::Network(err.to_string()),
        }
    }
}

/// Uniform error body across every classification branch.
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = %status, kind = self.kind(), detail = %self, "request failed");
        let body = Json(ErrorBody {
            message: self.message(),
            kind: self.kind(),
            error: self.detail(),
        });
        (status, body).into_response()
    }
}
