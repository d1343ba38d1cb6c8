use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use newsreel_db::models::entry::EntryStats;
use newsreel_db::repositories::EntryRepo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be queried.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Stored and rendered entry counts; absent when the database is down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<EntryStats>,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let entries = match EntryRepo::stats(&state.pool).await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(error = %e, "Health probe could not reach the database");
            None
        }
    };

    Json(HealthResponse {
        status: if entries.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy: entries.is_some(),
        entries,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
