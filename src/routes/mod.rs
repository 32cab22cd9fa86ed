//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/upload` - File upload returning a time-limited signed download link
//! - `/api/health` - Health checks
//! - `/` - Static file serving (upload page)

pub mod health;
pub mod static_files;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
///
/// API routes take precedence over static files; the body limit caps
/// uploads before buffering completes.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state.config.upload.max_upload_bytes;
    let allowed_origins = state.config.server.cors_allowed_origins.clone();
    let static_dir = state.config.upload.static_dir.clone();

    let api_router = Router::new()
        .merge(upload::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let router = Router::new()
        .merge(api_router)
        .merge(static_files::router(&static_dir))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}
