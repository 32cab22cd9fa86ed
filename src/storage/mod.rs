//! Blob storage adapter.
//!
//! Talks to an Azure-Blob-compatible endpoint over plain REST: Shared Key
//! request signing for writes, service SAS tokens for download links. The
//! client is rebuilt per request from the cached connection string; only
//! the HTTP connection pool is shared.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub mod blob_client;
pub mod sas;

pub use blob_client::BlobClient;

/// Storage service REST API version stamped on requests and tokens.
pub const API_VERSION: &str = "2023-11-03";

/// Validity window for download links. Fixed by contract, not configurable.
pub const DOWNLOAD_TTL_SECS: i64 = 24 * 60 * 60;

/// Structured storage failure; the upload handler classifies responses by
/// matching on these variants.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage configuration error: {0}")]
    Configuration(String),

    #[error("storage provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("storage request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Parsed form of a `Key=Value;…` storage connection string.
///
/// Only the blob-relevant fields are interpreted; other service endpoints
/// in the string are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionString {
    pub protocol: String,
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
    pub endpoint_suffix: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.trim().is_empty() {
            return Err(StorageError::Configuration(
                "storage connection string is empty".to_string(),
            ));
        }

        let mut conn = Self {
            protocol: "https".to_string(),
            account_name: None,
            account_key: None,
            blob_endpoint: None,
            endpoint_suffix: "core.windows.net".to_string(),
        };
        let mut recognized = false;

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            // AccountKey values end in base64 padding, so only the first
            // '=' separates key and value.
            let Some((key, value)) = segment.split_once('=') else {
                return Err(StorageError::Configuration(format!(
                    "malformed connection string segment: '{segment}'"
                )));
            };
            match key {
                "DefaultEndpointsProtocol" => {
                    conn.protocol = value.to_string();
                    recognized = true;
                }
                "AccountName" => {
                    conn.account_name = non_empty(value);
                    recognized = true;
                }
                "AccountKey" => {
                    conn.account_key = non_empty(value);
                    recognized = true;
                }
                "BlobEndpoint" => {
                    conn.blob_endpoint = non_empty(value).map(|v| v.trim_end_matches('/').to_string());
                    recognized = true;
                }
                "EndpointSuffix" => {
                    conn.endpoint_suffix = value.to_string();
                    recognized = true;
                }
                _ => {}
            }
        }

        if !recognized {
            return Err(StorageError::Configuration(
                "connection string contains no recognized fields".to_string(),
            ));
        }
        Ok(conn)
    }

    /// Blob service endpoint for the given account, without a trailing
    /// slash. An explicit `BlobEndpoint` wins over the derived form.
    pub fn blob_endpoint_for(&self, account: &str) -> String {
        match &self.blob_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("{}://{}.blob.{}", self.protocol, account, self.endpoint_suffix),
        }
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// HMAC-SHA256 over `data`, base64-encoded. Shared by Shared Key request
/// signing and SAS generation.
pub(crate) fn hmac_sha256_base64(key: &[u8], data: &str) -> Result<String, StorageError> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| StorageError::Configuration(format!("account key unusable for HMAC: {e}")))?;
    mac.update(data.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}
