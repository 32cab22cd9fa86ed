use axum::{extract::State, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse};
use crate::secrets::SecretState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let secrets = match &state.secrets {
        SecretState::Loaded(_) => "loaded",
        SecretState::Unavailable { .. } => "unavailable",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        secrets: secrets.to_string(),
    })
}
