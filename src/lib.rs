// Blobshare - file upload service returning time-limited signed download links

pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod secrets;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
