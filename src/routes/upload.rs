//! File upload endpoint.
//!
//! `POST /upload`, multipart field `file`. The payload is written to the
//! configured container under its original filename (a later upload with
//! the same name overwrites the earlier object) and the response carries
//! a read-only download link valid for 24 hours.

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use crate::models::{AppState, UploadResponse, UploadedFile};
use crate::secrets::SecretState;
use crate::storage::BlobClient;
use crate::types::{AppError, AppResult};
use crate::utils::{content_type_for, sanitize_blob_name};

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload_file))
}

async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    // Validation first: no external service is touched until a usable
    // file field has been read out of the payload.
    let file = read_file_field(multipart).await?;

    let secrets = match &state.secrets {
        SecretState::Loaded(secrets) => secrets.clone(),
        SecretState::Unavailable { reason } => return Err(AppError::SecretStore(reason.clone())),
    };

    let client = BlobClient::from_secrets(
        state.http.clone(),
        &secrets,
        &state.config.upload.container,
    )?;

    info!(file = %file.name, bytes = file.bytes.len(), "uploading file");

    client
        .put_blob(&file.name, &file.bytes, &file.content_type)
        .await?;

    let file_url = client.signed_download_url(&file.name, Utc::now())?;

    info!(file = %file.name, "file uploaded");

    Ok(Json(UploadResponse { file_url }))
}

/// Walk the multipart fields and return the first `file` field carrying a
/// usable filename. Everything else in the payload is skipped.
async fn read_file_field(mut multipart: Multipart) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(name) = field.file_name().and_then(sanitize_blob_name) else {
            continue;
        };
        let declared = field.content_type().map(|ct| ct.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
        let content_type = content_type_for(&name, declared.as_deref());
        return Ok(UploadedFile {
            name,
            bytes,
            content_type,
        });
    }
    Err(AppError::MissingFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ServerConfig, UploadConfig, VaultConfig};
    use crate::routes::create_router;
    use crate::secrets::StorageSecrets;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const KEY_B64: &str = "c2VjcmV0LWFjY291bnQta2V5";
    const BOUNDARY: &str = "X-BLOBSHARE-TEST-BOUNDARY";

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            vault: VaultConfig {
                url: None,
                access_token: None,
                tenant_id: None,
                client_id: None,
                client_secret: None,
                authority_host: "https://login.microsoftonline.com".to_string(),
                required: false,
            },
            upload: UploadConfig {
                container: "uploads".to_string(),
                max_upload_bytes: 1024 * 1024,
                static_dir: "public".to_string(),
            },
        }
    }

    fn state_with(secrets: SecretState) -> AppState {
        AppState {
            config: test_config(),
            secrets,
            http: reqwest::Client::new(),
        }
    }

    fn loaded_secrets(endpoint: &str) -> SecretState {
        SecretState::Loaded(Arc::new(StorageSecrets {
            connection_string: format!(
                "DefaultEndpointsProtocol=http;AccountName=devaccount;AccountKey={KEY_B64};BlobEndpoint={endpoint}/devaccount"
            ),
            account_name: String::new(),
            account_key: String::new(),
        }))
    }

    fn file_body(field: &str, filename: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        )
    }

    fn upload_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_any_storage_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let app = create_router(state_with(loaded_secrets(&server.url())));
        let response = app
            .oneshot(upload_request(file_body("avatar", "a.txt", "hi")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "missing_file");
        assert_eq!(json["message"], "No file uploaded.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn file_field_without_a_filename_counts_as_missing() {
        let app = create_router(state_with(SecretState::Unavailable {
            reason: "never reached".to_string(),
        }));
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\njust text\r\n--{BOUNDARY}--\r\n"
        );
        let response = app.oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "missing_file");
    }

    #[tokio::test]
    async fn successful_upload_returns_a_signed_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/devaccount/uploads/report.pdf")
            .with_status(201)
            .create_async()
            .await;

        let app = create_router(state_with(loaded_secrets(&server.url())));
        let response = app
            .oneshot(upload_request(file_body("file", "report.pdf", "pdf bytes")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let url = json["fileUrl"].as_str().expect("fileUrl");
        assert!(url.contains("/uploads/report.pdf?"));
        assert!(url.contains("sp=r"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn signed_url_expires_about_a_day_after_issuance() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/devaccount/uploads/report.pdf")
            .with_status(201)
            .create_async()
            .await;

        let app = create_router(state_with(loaded_secrets(&server.url())));
        let response = app
            .oneshot(upload_request(file_body("file", "report.pdf", "pdf bytes")))
            .await
            .unwrap();
        let json = body_json(response).await;
        let url = json["fileUrl"].as_str().expect("fileUrl");

        let expiry_raw = url
            .split("se=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .expect("se parameter");
        let expiry = chrono::DateTime::parse_from_rfc3339(&expiry_raw.replace("%3A", ":"))
            .expect("parseable expiry")
            .with_timezone(&Utc);

        let delta = (expiry - Utc::now()).num_seconds();
        assert!(
            (delta - 24 * 3600).abs() < 30,
            "expiry {delta}s away from now, expected about 24h"
        );
    }

    #[tokio::test]
    async fn empty_connection_string_is_a_configuration_error() {
        let app = create_router(state_with(SecretState::Loaded(Arc::new(StorageSecrets {
            connection_string: String::new(),
            account_name: String::new(),
            account_key: String::new(),
        }))));
        let response = app
            .oneshot(upload_request(file_body("file", "report.pdf", "pdf bytes")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["kind"], "configuration");
    }

    #[tokio::test]
    async fn provider_rejection_is_classified_as_provider() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/devaccount/uploads/report.pdf")
            .with_status(500)
            .with_body("InternalError")
            .create_async()
            .await;

        let app = create_router(state_with(loaded_secrets(&server.url())));
        let response = app
            .oneshot(upload_request(file_body("file", "report.pdf", "pdf bytes")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "provider");
        assert!(json["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn reupload_with_the_same_name_overwrites() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/devaccount/uploads/notes.txt")
            .with_status(201)
            .expect(2)
            .create_async()
            .await;

        let app = create_router(state_with(loaded_secrets(&server.url())));
        for content in ["first version", "second version"] {
            let response = app
                .clone()
                .oneshot(upload_request(file_body("file", "notes.txt", content)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unavailable_secrets_fail_at_request_time() {
        let app = create_router(state_with(SecretState::Unavailable {
            reason: "secret store unreachable at startup".to_string(),
        }));
        let response = app
            .oneshot(upload_request(file_body("file", "report.pdf", "pdf bytes")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "secret_store");
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("unreachable at startup"));
    }

    #[tokio::test]
    async fn client_supplied_paths_are_flattened_to_the_basename() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/devaccount/uploads/passwd")
            .with_status(201)
            .create_async()
            .await;

        let app = create_router(state_with(loaded_secrets(&server.url())));
        let response = app
            .oneshot(upload_request(file_body("file", "../../etc/passwd", "x")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_async().await;
    }
}
