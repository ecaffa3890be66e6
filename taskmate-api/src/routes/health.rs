/// Liveness probe: `GET /health`
///
/// Public, no session needed. Always answers 200; a lost database shows up
/// as `"status": "degraded"` with `"database": "disconnected"`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use taskmate_shared::db::pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,

    /// Crate version of the running binary
    pub version: &'static str,

    pub database: DatabaseStatus,
}

impl HealthResponse {
    fn from_database(database: DatabaseStatus) -> Self {
        let status = match database {
            DatabaseStatus::Connected => ServiceStatus::Healthy,
            DatabaseStatus::Disconnected => ServiceStatus::Degraded,
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match pool::health_check(&state.db).await {
        Ok(()) => DatabaseStatus::Connected,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            DatabaseStatus::Disconnected
        }
    };

    Ok(Json(HealthResponse::from_database(database)))
}
