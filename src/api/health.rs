//! Health check endpoint

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

use super::extract::Json;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current status of the service
    pub status: String,
    /// Version of the service
    pub version: String,
    /// Whether the database answered
    pub database: bool,
}

/// Liveness probe; reports database reachability without failing on it
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: state.services.database_ready().await,
    })
}
