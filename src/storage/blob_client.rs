//! REST client for one blob container.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use super::sas::BlobSasRequest;
use super::{hmac_sha256_base64, non_empty, ConnectionString, StorageError, API_VERSION, DOWNLOAD_TTL_SECS};
use crate::secrets::StorageSecrets;

/// Blob names keep '/' unencoded; everything else outside the unreserved
/// set is percent-encoded.
const BLOB_PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Client for a single container, built per request from the cached
/// secrets. Holds no connection state of its own beyond the shared pool.
#[derive(Debug)]
pub struct BlobClient {
    http: reqwest::Client,
    endpoint: String,
    account: String,
    container: String,
    key_bytes: Vec<u8>,
}

impl BlobClient {
    /// Build a client from the vaulted secrets.
    ///
    /// The connection string is authoritative; the separately vaulted
    /// account name and key fill in whatever it omits.
    pub fn from_secrets(
        http: reqwest::Client,
        secrets: &StorageSecrets,
        container: &str,
    ) -> Result<Self, StorageError> {
        let conn = ConnectionString::parse(&secrets.connection_string)?;

        let account = conn
            .account_name
            .clone()
            .or_else(|| non_empty(&secrets.account_name))
            .ok_or_else(|| {
                StorageError::Configuration(
                    "no AccountName in the connection string and no account-name secret cached"
                        .to_string(),
                )
            })?;
        let account_key = conn
            .account_key
            .clone()
            .or_else(|| non_empty(&secrets.account_key))
            .ok_or_else(|| {
                StorageError::Configuration(
                    "no AccountKey in the connection string and no account-key secret cached"
                        .to_string(),
                )
            })?;
        let key_bytes = BASE64_STANDARD
            .decode(account_key.trim())
            .map_err(|e| StorageError::Configuration(format!("account key is not valid base64: {e}")))?;

        let endpoint = conn.blob_endpoint_for(&account);
        Ok(Self {
            http,
            endpoint,
            account,
            container: container.to_string(),
            key_bytes,
        })
    }

    /// Canonical URL of a blob in this container, without any token.
    pub fn blob_url(&self, blob: &str) -> String {
        let encoded = utf8_percent_encode(blob, BLOB_PATH_ENCODE_SET);
        format!("{}/{}/{}", self.endpoint, self.container, encoded)
    }

    /// Put Blob: write the whole buffer as a block blob under `blob`.
    /// A second write to the same name overwrites the first.
    pub async fn put_blob(
        &self,
        blob: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.blob_url(blob);
        let date = rfc1123_date(Utc::now());
        let authorization = self.shared_key_authorization("PUT", blob, data.len(), content_type, &date)?;

        debug!(url = %url, bytes = data.len(), "put blob");

        let response = self
            .http
            .put(&url)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", content_type)
            .header("Authorization", authorization)
            .body(data.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Provider { status, body });
        }
        Ok(())
    }

    /// Canonical blob URL plus a read-only SAS issued at `issued_at` and
    /// valid for the fixed window.
    pub fn signed_download_url(
        &self,
        blob: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let request = BlobSasRequest {
            account: &self.account,
            container: &self.container,
            blob,
            starts: issued_at,
            expires: issued_at + chrono::Duration::seconds(DOWNLOAD_TTL_SECS),
        };
        let token = request.sign(&self.key_bytes)?;
        Ok(format!("{}?{}", self.blob_url(blob), token))
    }

    /// Shared Key authorization header for a write carrying a body.
    ///
    /// String-to-sign layout per the Shared Key scheme: VERB, the standard
    /// headers (only Content-Length and Content-Type populated here), the
    /// canonicalized x-ms-* headers, then the canonicalized resource.
    fn shared_key_authorization(
        &self,
        method: &str,
        blob: &str,
        content_length: usize,
        content_type: &str,
        date: &str,
    ) -> Result<String, StorageError> {
        let content_length = if content_length == 0 {
            String::new()
        } else {
            content_length.to_string()
        };
        let canonicalized_headers = format!(
            "x-ms-blob-type:BlockBlob\nx-ms-date:{date}\nx-ms-version:{API_VERSION}"
        );
        // The canonicalized resource uses the un-encoded blob name, not
        // the percent-encoded URL form.
        let canonicalized_resource = format!("/{}/{}/{}", self.account, self.container, blob);
        let string_to_sign = format!(
            "{method}\n\n\n{content_length}\n\n{content_type}\n\n\n\n\n\n\n{canonicalized_headers}\n{canonicalized_resource}"
        );
        let signature = hmac_sha256_base64(&self.key_bytes, &string_to_sign)?;
        Ok(format!("SharedKey {}:{}", self.account, signature))
    }
}

fn rfc1123_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
