//! Secret loading from the managed secret store.
//!
//! Runs once at startup. The result is immutable for the life of the
//! process; there is no refresh or rotation.

pub mod keyvault;

use std::sync::Arc;

pub use keyvault::{SecretClient, SecretStoreError};

use crate::config::VaultConfig;

/// Secret names are fixed by the deployment; they match the vault entries
/// the service has always used.
pub const SECRET_CONNECTION_STRING: &str = "AZURESTORAGECONNECTIONSTRING";
pub const SECRET_ACCOUNT_NAME: &str = "AZURESTORAGEACCOUNTNAME";
pub const SECRET_ACCOUNT_KEY: &str = "AZURESTORAGEACCOUNTKEY";

/// Storage credentials pulled from the vault at startup.
#[derive(Debug, Clone)]
pub struct StorageSecrets {
    pub connection_string: String,
    pub account_name: String,
    pub account_key: String,
}

/// Outcome of the startup secret load, carried in application state.
/// `Unavailable` keeps the process serving; each upload then fails with a
/// visible secret-store classification instead of a crash at boot.
#[derive(Debug, Clone)]
pub enum SecretState {
    Loaded(Arc<StorageSecrets>),
    Unavailable { reason: String },
}

/// Fetch all three storage secrets. Any individual failure fails the
/// whole load; the caller decides whether that is fatal.
pub async fn load_storage_secrets(
    http: &reqwest::Client,
    vault: &VaultConfig,
) -> Result<StorageSecrets, SecretStoreError> {
    let client = SecretClient::new(http.clone(), vault)?;
    let connection_string = client.get_secret(SECRET_CONNECTION_STRING).await?;
    let account_name = client.get_secret(SECRET_ACCOUNT_NAME).await?;
    let account_key = client.get_secret(SECRET_ACCOUNT_KEY).await?;
    Ok(StorageSecrets {
        connection_string,
        account_name,
        account_key,
    })
}
