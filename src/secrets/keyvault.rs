//! Key-Vault-style secret store client.
//!
//! Fetches named secrets over authenticated HTTPS. The ambient credential
//! is resolved once from configuration: a pre-acquired bearer token when
//! the environment provides one, otherwise the OAuth2 client-credentials
//! flow against the configured authority.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::VaultConfig;

const SECRETS_API_VERSION: &str = "7.4";
const VAULT_SCOPE: &str = "https://vault.azure.net/.default";

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret store is not configured: {0}")]
    NotConfigured(String),

    #[error("no usable ambient credential: {0}")]
    Credential(String),

    #[error("secret store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("secret store returned HTTP {status} for '{name}'")]
    Provider { name: String, status: u16 },

    #[error("malformed secret store response for '{name}': {detail}")]
    InvalidResponse { name: String, detail: String },
}

#[derive(Debug)]
enum Credential {
    Static(String),
    ClientSecret {
        authority: String,
        tenant: String,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug)]
pub struct SecretClient {
    http: reqwest::Client,
    vault_url: String,
    credential: Credential,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl SecretClient {
    pub fn new(http: reqwest::Client, vault: &VaultConfig) -> Result<Self, SecretStoreError> {
        let vault_url = vault
            .url
            .clone()
            .ok_or_else(|| {
                SecretStoreError::NotConfigured(
                    "KEY_VAULT_URL or KEY_VAULT_NAME must be set".to_string(),
                )
            })?
            .trim_end_matches('/')
            .to_string();

        let credential = match vault.access_token.clone().filter(|t| !t.is_empty()) {
            Some(token) => Credential::Static(token),
            None => match (&vault.tenant_id, &vault.client_id, &vault.client_secret) {
                (Some(tenant), Some(client_id), Some(client_secret)) => Credential::ClientSecret {
                    authority: vault.authority_host.trim_end_matches('/').to_string(),
                    tenant: tenant.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                },
                _ => {
                    return Err(SecretStoreError::Credential(
                        "set AZURE_ACCESS_TOKEN, or AZURE_TENANT_ID with AZURE_CLIENT_ID and AZURE_CLIENT_SECRET"
                            .to_string(),
                    ))
                }
            },
        };

        Ok(Self {
            http,
            vault_url,
            credential,
        })
    }

    async fn bearer_token(&self) -> Result<String, SecretStoreError> {
        match &self.credential {
            Credential::Static(token) => Ok(token.clone()),
            Credential::ClientSecret {
                authority,
                tenant,
                client_id,
                client_secret,
            } => {
                let url = format!("{authority}/{tenant}/oauth2/v2.0/token");
                let response = self
                    .http
                    .post(&url)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", VAULT_SCOPE),
                    ])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(SecretStoreError::Credential(format!(
                        "token endpoint returned HTTP {}",
                        response.status().as_u16()
                    )));
                }
                let token: TokenResponse = response.json().await.map_err(|e| {
                    SecretStoreError::Credential(format!("malformed token response: {e}"))
                })?;
                Ok(token.access_token)
            }
        }
    }

    /// Fetch the latest version of one named secret.
    pub async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/secrets/{}", self.vault_url, name);

        debug!(secret = name, "fetching secret");

        let response = self
            .http
            .get(&url)
            .query(&[("api-version", SECRETS_API_VERSION)])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SecretStoreError::Provider {
                name: name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bundle: SecretBundle = response.json().await.map_err(|e| {
            SecretStoreError::InvalidResponse {
                name: name.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(bundle.value)
    }
}
