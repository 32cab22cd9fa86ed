use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blobshare::secrets::{self, SecretState};
use blobshare::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blobshare=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    // Load storage secrets from the secret store. A failure is fatal only
    // when the deployment opted into VAULT_SECRETS_REQUIRED; otherwise the
    // server starts and every upload reports the missing secrets itself.
    let http = reqwest::Client::new();
    let secrets = match secrets::load_storage_secrets(&http, &config.vault).await {
        Ok(loaded) => {
            info!("Secrets loaded successfully");
            SecretState::Loaded(Arc::new(loaded))
        }
        Err(err) if config.vault.required => {
            error!(error = %err, "Failed to load secrets from the secret store");
            return Err(err.into());
        }
        Err(err) => {
            error!(
                error = %err,
                "Failed to load secrets from the secret store; uploads will fail until they are available"
            );
            SecretState::Unavailable {
                reason: err.to_string(),
            }
        }
    };

    // Create shared state
    let state = AppState {
        config: config.clone(),
        secrets,
        http,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
