use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub vault: VaultConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Where and how to reach the managed secret store.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Base URL of the vault, e.g. `https://my-vault.vault.azure.net`.
    /// `None` when neither KEY_VAULT_URL nor KEY_VAULT_NAME is set; the
    /// secret loader then fails with a configuration diagnostic.
    pub url: Option<String>,
    /// Pre-acquired bearer token, if the environment provides one.
    pub access_token: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// OAuth authority, overridable for tests and sovereign clouds.
    pub authority_host: String,
    /// When true, startup aborts if the secrets cannot be loaded instead
    /// of deferring the failure to the first upload request.
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub container: String,
    pub max_upload_bytes: usize,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            vault: VaultConfig {
                url: vault_url(env::var("KEY_VAULT_URL").ok(), env::var("KEY_VAULT_NAME").ok()),
                access_token: env::var("AZURE_ACCESS_TOKEN").ok(),
                tenant_id: env::var("AZURE_TENANT_ID").ok(),
                client_id: env::var("AZURE_CLIENT_ID").ok(),
                client_secret: env::var("AZURE_CLIENT_SECRET").ok(),
                authority_host: env::var("AZURE_AUTHORITY_HOST")
                    .unwrap_or_else(|_| "https://login.microsoftonline.com".to_string()),
                required: env::var("VAULT_SECRETS_REQUIRED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()?,
            },
            upload: UploadConfig {
                container: env::var("UPLOAD_CONTAINER").unwrap_or_else(|_| "uploads".to_string()),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| (1024 * 1024 * 1024).to_string())
                    .parse()?,
                static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            },
        })
    }
}

/// An explicit KEY_VAULT_URL wins; otherwise derive the public-cloud URL
/// from the vault name, the same way the upstream service did.
fn vault_url(explicit: Option<String>, name: Option<String>) -> Option<String> {
    explicit
        .filter(|url| !url.trim().is_empty())
        .or_else(|| {
            name.filter(|n| !n.trim().is_empty())
                .map(|n| format!("https://{n}.vault.azure.net"))
        })
}
