use crate::config::Config;
use crate::secrets::SecretState;

/// Shared application state, cloned into every handler.
///
/// Everything here is immutable after startup, so requests share it
/// without synchronization.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub secrets: SecretState,
    /// Shared connection pool for the storage and secret-store adapters.
    pub http: reqwest::Client,
}

// API request/response types

/// One file pulled out of the multipart payload.
#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: bytes::Bytes,
    pub content_type: String,
}

#[derive(Debug, serde::Serialize)]
pub struct UploadResponse {
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub secrets: String,
}
